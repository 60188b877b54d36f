//! One dashboard run: read, unify, then compute every analytics stage.

use crate::analytics::alignment::AlignmentError;
use crate::analytics::correlation::{correlate, CorrelationMatrix};
use crate::analytics::derived::{derive_series, DerivedSeries};
use crate::analytics::monthly::{monthly_returns, MonthlyReturn};
use crate::analytics::sector::{sector_averages, SectorReport};
use crate::analytics::summary::{summarize, SymbolSummary};
use crate::config::{ConfigError, DashboardConfig};
use crate::csv_source::CsvDirectorySource;
use crate::dataset::UnifiedDataset;
use crate::reader::{read_sources, SourceWarning};
use crate::time_series::{SeriesSource, SourceError};
use std::fmt;

/// Failures that prevent a run from producing any output.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Invalid configuration
    Config(ConfigError),
    /// The source could not be enumerated
    Source(SourceError),
    /// No symbol produced a record in the target year
    NoData { warnings: Vec<SourceWarning> },
    /// The bounded reader pool could not be created
    WorkerPool(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(e) => write!(f, "Configuration error: {}", e),
            PipelineError::Source(e) => write!(f, "Source error: {}", e),
            PipelineError::NoData { warnings } => write!(
                f,
                "No CSV files loaded ({} inputs skipped)",
                warnings.len()
            ),
            PipelineError::WorkerPool(msg) => write!(f, "Worker pool error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Config(e) => Some(e),
            PipelineError::Source(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SourceError> for PipelineError {
    fn from(e: SourceError) -> Self {
        PipelineError::Source(e)
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        PipelineError::Config(e)
    }
}

/// Everything a run computed. Views render from this without further I/O.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub year: i32,
    pub dataset: UnifiedDataset,
    /// Inputs skipped while reading
    pub warnings: Vec<SourceWarning>,
    pub summaries: Vec<SymbolSummary>,
    pub derived: Vec<DerivedSeries>,
    pub monthly: Vec<MonthlyReturn>,
    /// An alignment failure only disables the correlation view
    pub correlation: Result<CorrelationMatrix, AlignmentError>,
    pub sectors: SectorReport,
}

/// Runs the whole pipeline against `source`.
///
/// The analytics stages only share the dataset by reference and run
/// concurrently.
///
/// # Errors
/// See [`PipelineError`]. Per-symbol read problems are not errors; they are
/// returned in [`PipelineOutput::warnings`].
pub fn run<S>(source: &S, config: &DashboardConfig) -> Result<PipelineOutput, PipelineError>
where
    S: SeriesSource + ?Sized,
{
    config.validate()?;
    let range = config.date_range()?;

    let batch = read_sources(source, &range, config.max_workers)?;
    let dataset = UnifiedDataset::build(batch.series);

    let ((summaries, derived), ((monthly, correlation), sectors)) = rayon::join(
        || rayon::join(|| summarize(&dataset), || derive_series(&dataset)),
        || {
            rayon::join(
                || rayon::join(|| monthly_returns(&dataset), || correlate(&dataset)),
                || sector_averages(&dataset, &config.sectors),
            )
        },
    );

    if let Err(e) = &correlation {
        tracing::warn!("Correlation unavailable: {}", e);
    }
    tracing::info!(
        "Pipeline finished: {} records, {} symbols, {} warnings",
        dataset.len(),
        summaries.len(),
        batch.warnings.len()
    );

    Ok(PipelineOutput {
        year: range.year(),
        dataset,
        warnings: batch.warnings,
        summaries,
        derived,
        monthly,
        correlation,
        sectors,
    })
}

/// Opens `config.data_dir` as a CSV directory and runs the pipeline on it.
pub fn run_directory(config: &DashboardConfig) -> Result<PipelineOutput, PipelineError> {
    let source = CsvDirectorySource::open(&config.data_dir)?;
    run(&source, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;
    use crate::time_series::{InMemorySource, SourceParseError};
    use chrono::NaiveDate;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, day).unwrap()
    }

    fn config() -> DashboardConfig {
        DashboardConfig {
            max_workers: 2,
            ..DashboardConfig::new("unused")
        }
    }

    #[test]
    fn runs_every_stage_on_in_memory_source() {
        let mut source = InMemorySource::new();
        source.add_closes(
            Symbol::new("TCS").unwrap(),
            &[(d(1, 2), 100.0), (d(1, 3), 105.0), (d(2, 1), 110.0)],
        );
        source.add_closes(
            Symbol::new("INFY").unwrap(),
            &[(d(1, 2), 50.0), (d(1, 3), 49.0), (d(2, 1), 51.0)],
        );

        let output = run(&source, &config()).unwrap();
        assert_eq!(output.year, 2023);
        assert_eq!(output.dataset.len(), 6);
        assert_eq!(output.summaries.len(), 2);
        assert_eq!(output.derived.len(), 2);
        assert_eq!(output.monthly.len(), 4);
        assert!(output.correlation.is_ok());
        assert_eq!(output.sectors.averages.len(), 1);
        assert_eq!(output.sectors.averages[0].sector, "IT");
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn failing_symbol_is_a_warning_not_an_error() {
        let mut source = InMemorySource::new();
        source.add_closes(Symbol::new("GOOD").unwrap(), &[(d(3, 1), 1.0)]);
        source.add_failure(
            Symbol::new("BAD").unwrap(),
            SourceParseError::MissingColumn("close"),
        );

        let output = run(&source, &config()).unwrap();
        assert_eq!(output.summaries.len(), 1);
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].source, "BAD");
    }

    #[test]
    fn empty_source_is_no_data() {
        let source = InMemorySource::new();
        assert!(matches!(
            run(&source, &config()),
            Err(PipelineError::NoData { .. })
        ));
    }

    #[test]
    fn invalid_config_stops_before_reading() {
        let source = InMemorySource::new();
        let config = DashboardConfig {
            max_workers: 0,
            ..config()
        };
        assert!(matches!(
            run(&source, &config),
            Err(PipelineError::Config(ConfigError::InvalidWorkers(_)))
        ));
    }

    #[test]
    fn missing_directory_is_a_source_error() {
        let config = DashboardConfig::new("/definitely/not/a/dir");
        assert!(matches!(
            run_directory(&config),
            Err(PipelineError::Source(_))
        ));
    }
}
