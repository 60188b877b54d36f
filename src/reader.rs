//! Source reader: pulls every symbol's series out of a [`SeriesSource`].
//!
//! Symbols are read on a bounded rayon pool. A symbol that fails to parse is
//! skipped with a [`SourceWarning`]; the run only fails when nothing at all
//! could be read.

use crate::pipeline::PipelineError;
use crate::symbol::Symbol;
use crate::time_series::{DailyRecord, DateRange, SeriesSource, SourceParseError};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use std::fmt;

/// One symbol's records as returned by the source, filtered to the target year.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSeries {
    pub symbol: Symbol,
    pub records: Vec<DailyRecord>,
}

/// Why an input was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// The file name does not form a valid symbol
    InvalidName,
    /// Another input already provides the same symbol
    DuplicateSymbol,
    /// The series could not be parsed
    Unreadable(SourceParseError),
    /// The series parsed but has no rows in the target year
    NoRecordsInYear,
}

/// A per-input problem recorded instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceWarning {
    /// Symbol, or raw file name when no symbol could be derived
    pub source: String,
    pub kind: WarningKind,
}

impl fmt::Display for SourceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::InvalidName => {
                write!(f, "Skipped {}: name is not a valid symbol", self.source)
            }
            WarningKind::DuplicateSymbol => write!(
                f,
                "Skipped {}: another file already provides this symbol",
                self.source
            ),
            WarningKind::Unreadable(error) => {
                write!(f, "Error loading {}: {}", self.source, error)
            }
            WarningKind::NoRecordsInYear => {
                write!(f, "Skipped {}: no records in target year", self.source)
            }
        }
    }
}

impl Serialize for SourceWarning {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Everything the reader produced: usable series plus skipped-input warnings.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub series: Vec<SymbolSeries>,
    pub warnings: Vec<SourceWarning>,
}

/// Reads all symbols from `source` within `range` using at most `max_workers` threads.
///
/// Output order follows the source's listing order, independent of thread
/// scheduling.
///
/// # Errors
/// * [`PipelineError::Source`] if the source cannot be enumerated
/// * [`PipelineError::WorkerPool`] if the thread pool cannot be created
/// * [`PipelineError::NoData`] if no symbol yielded any record
pub fn read_sources<S>(
    source: &S,
    range: &DateRange,
    max_workers: usize,
) -> Result<SourceBatch, PipelineError>
where
    S: SeriesSource + ?Sized,
{
    let listing = source.list_symbols()?;

    let mut warnings: Vec<SourceWarning> = listing
        .rejected
        .into_iter()
        .map(|name| SourceWarning {
            source: name,
            kind: WarningKind::InvalidName,
        })
        .collect();
    for name in listing.duplicates {
        log::warn!("Skipped {}: duplicate symbol", name);
        warnings.push(SourceWarning {
            source: name,
            kind: WarningKind::DuplicateSymbol,
        });
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(max_workers.max(1))
        .build()
        .map_err(|e| PipelineError::WorkerPool(e.to_string()))?;

    let results: Vec<(Symbol, Result<Vec<DailyRecord>, SourceParseError>)> = pool.install(|| {
        listing
            .symbols
            .par_iter()
            .map(|symbol| (symbol.clone(), source.read_series(symbol, range)))
            .collect()
    });

    let mut series = Vec::with_capacity(results.len());
    for (symbol, result) in results {
        match result {
            Ok(records) if records.is_empty() => {
                log::warn!("No {} records for {}", range.year(), symbol);
                warnings.push(SourceWarning {
                    source: symbol.to_string(),
                    kind: WarningKind::NoRecordsInYear,
                });
            }
            Ok(records) => series.push(SymbolSeries { symbol, records }),
            Err(error) => {
                log::warn!("Error loading {}: {}", symbol, error);
                warnings.push(SourceWarning {
                    source: symbol.to_string(),
                    kind: WarningKind::Unreadable(error),
                });
            }
        }
    }

    if series.is_empty() {
        return Err(PipelineError::NoData { warnings });
    }

    tracing::info!(
        "Loaded {} symbols for {} ({} skipped)",
        series.len(),
        range.year(),
        warnings.len()
    );

    Ok(SourceBatch { series, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_series::InMemorySource;
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, d).unwrap()
    }

    fn year() -> DateRange {
        DateRange::calendar_year(2023).unwrap()
    }

    #[test]
    fn unreadable_symbol_is_skipped_with_warning() {
        let mut source = InMemorySource::new();
        source.add_closes(Symbol::new("AAA").unwrap(), &[(date(1, 2), 10.0)]);
        source.add_failure(
            Symbol::new("BBB").unwrap(),
            SourceParseError::MissingColumn("close"),
        );

        let batch = read_sources(&source, &year(), 2).unwrap();
        assert_eq!(batch.series.len(), 1);
        assert_eq!(batch.series[0].symbol.as_str(), "AAA");
        assert_eq!(batch.warnings.len(), 1);
        assert_eq!(batch.warnings[0].source, "BBB");
        assert_eq!(
            batch.warnings[0].kind,
            WarningKind::Unreadable(SourceParseError::MissingColumn("close"))
        );
        assert!(batch.warnings[0].to_string().contains("BBB"));
    }

    #[test]
    fn symbol_without_target_year_rows_is_skipped() {
        let mut source = InMemorySource::new();
        source.add_closes(Symbol::new("AAA").unwrap(), &[(date(1, 2), 10.0)]);
        source.add_closes(
            Symbol::new("OLD").unwrap(),
            &[(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(), 5.0)],
        );

        let batch = read_sources(&source, &year(), 1).unwrap();
        assert_eq!(batch.series.len(), 1);
        assert_eq!(batch.warnings[0].kind, WarningKind::NoRecordsInYear);
    }

    #[test]
    fn zero_readable_symbols_is_fatal() {
        let mut source = InMemorySource::new();
        source.add_failure(Symbol::new("BAD").unwrap(), SourceParseError::UnknownSymbol);

        match read_sources(&source, &year(), 4) {
            Err(PipelineError::NoData { warnings }) => assert_eq!(warnings.len(), 1),
            other => panic!("expected NoData, got {:?}", other),
        }
    }

    #[test]
    fn empty_source_is_fatal() {
        let source = InMemorySource::new();
        assert!(matches!(
            read_sources(&source, &year(), 1),
            Err(PipelineError::NoData { .. })
        ));
    }

    #[test]
    fn case_variant_duplicate_file_is_warned_not_read() {
        use crate::csv_source::CsvDirectorySource;
        use std::fs;

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("INFY.csv"), "date,close\n2023-01-02,20\n").unwrap();
        fs::write(dir.path().join("infy.csv"), "date,close\n2023-01-02,999\n").unwrap();
        let source = CsvDirectorySource::open(dir.path()).unwrap();

        let batch = read_sources(&source, &year(), 2).unwrap();
        assert_eq!(batch.series.len(), 1);
        assert_eq!(batch.series[0].records[0].close, 20.0);
        assert_eq!(batch.warnings.len(), 1);
        assert_eq!(batch.warnings[0].source, "infy.csv");
        assert_eq!(batch.warnings[0].kind, WarningKind::DuplicateSymbol);
        assert_eq!(
            batch.warnings[0].to_string(),
            "Skipped infy.csv: another file already provides this symbol"
        );
    }

    #[test]
    fn output_follows_listing_order_regardless_of_workers() {
        let mut source = InMemorySource::new();
        for name in ["ZED", "ALPHA", "MID", "BETA"] {
            source.add_closes(Symbol::new(name).unwrap(), &[(date(3, 1), 1.0)]);
        }

        let single = read_sources(&source, &year(), 1).unwrap();
        let many = read_sources(&source, &year(), 8).unwrap();
        let names = |batch: &SourceBatch| -> Vec<String> {
            batch.series.iter().map(|s| s.symbol.to_string()).collect()
        };
        assert_eq!(names(&single), vec!["ALPHA", "BETA", "MID", "ZED"]);
        assert_eq!(names(&single), names(&many));
    }
}
