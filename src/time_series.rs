use crate::symbol::Symbol;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One trading day of OHLC data for a single symbol.
///
/// Only `date` and `close` are required by the analytics; the remaining
/// columns are passed through when the source carries them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub symbol: Symbol,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<u64>,
}

impl DailyRecord {
    /// Creates a record carrying only a close price.
    pub fn from_close(symbol: Symbol, date: NaiveDate, close: f64) -> Self {
        DailyRecord {
            symbol,
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

/// Inclusive date window used to restrict a run to its target year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start date (inclusive)
    pub start: NaiveDate,
    /// End date (inclusive)
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// January 1st through December 31st of `year`.
    ///
    /// Returns `None` when the year is outside chrono's representable range.
    pub fn calendar_year(year: i32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
        Some(DateRange { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// The year of the start date.
    pub fn year(&self) -> i32 {
        self.start.year()
    }
}

/// Outcome of enumerating a source: usable symbols plus names that could not
/// be used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceListing {
    pub symbols: Vec<Symbol>,
    /// Names that do not form a valid symbol
    pub rejected: Vec<String>,
    /// Names whose symbol is already provided by an earlier input
    pub duplicates: Vec<String>,
}

/// Abstraction over wherever per-symbol daily series live.
///
/// Implementations must be shareable across reader threads; each call to
/// [`SeriesSource::read_series`] is independent.
pub trait SeriesSource: Sync {
    /// Enumerates the symbols this source can provide, in a stable order.
    ///
    /// # Errors
    /// Returns an error only when the source as a whole cannot be enumerated.
    fn list_symbols(&self) -> Result<SourceListing, SourceError>;

    /// Reads one symbol's records, keeping only dates inside `range`.
    ///
    /// # Errors
    /// Returns a [`SourceParseError`] when the symbol's data is unreadable or
    /// malformed. Callers treat this as recoverable.
    fn read_series(
        &self,
        symbol: &Symbol,
        range: &DateRange,
    ) -> Result<Vec<DailyRecord>, SourceParseError>;
}

/// Failure to enumerate a source at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The input directory is missing or unreadable
    DirectoryUnreadable(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::DirectoryUnreadable(msg) => {
                write!(f, "Input directory unreadable: {}", msg)
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// Errors raised while parsing one symbol's series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceParseError {
    /// The underlying file could not be opened or read
    Io(String),
    /// The CSV layer rejected the input
    Csv { line: u64, message: String },
    /// A required column is absent from the header
    MissingColumn(&'static str),
    /// A date cell did not match any accepted format
    InvalidDate { line: u64, value: String },
    /// A numeric cell could not be parsed
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },
    /// A price is negative or not finite
    InvalidPrice {
        line: u64,
        column: &'static str,
        value: String,
    },
    /// The same date appears more than once
    DuplicateDate(NaiveDate),
    /// The source has no data for the requested symbol
    UnknownSymbol,
}

impl fmt::Display for SourceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceParseError::Io(msg) => write!(f, "I/O error: {}", msg),
            SourceParseError::Csv { line, message } => {
                write!(f, "CSV error at line {}: {}", line, message)
            }
            SourceParseError::MissingColumn(column) => {
                write!(f, "Missing required column '{}'", column)
            }
            SourceParseError::InvalidDate { line, value } => {
                write!(f, "Invalid date '{}' at line {}", value, line)
            }
            SourceParseError::InvalidNumber {
                line,
                column,
                value,
            } => write!(f, "Invalid {} value '{}' at line {}", column, value, line),
            SourceParseError::InvalidPrice {
                line,
                column,
                value,
            } => write!(
                f,
                "{} must be a non-negative finite price, got '{}' at line {}",
                column, value, line
            ),
            SourceParseError::DuplicateDate(date) => write!(f, "Duplicate date {}", date),
            SourceParseError::UnknownSymbol => write!(f, "No data for symbol"),
        }
    }
}

impl std::error::Error for SourceParseError {}

/// In-memory source for tests and synthetic runs.
///
/// Series are stored as given; date filtering happens on read. A symbol can be
/// registered as failing to exercise the skip-and-warn path.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: BTreeMap<Symbol, Result<Vec<DailyRecord>, SourceParseError>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a series of `(date, close)` pairs for `symbol`.
    pub fn add_closes(&mut self, symbol: Symbol, closes: &[(NaiveDate, f64)]) {
        let records = closes
            .iter()
            .map(|&(date, close)| DailyRecord::from_close(symbol.clone(), date, close))
            .collect();
        self.series.insert(symbol, Ok(records));
    }

    /// Adds fully specified records for `symbol`.
    pub fn add_records(&mut self, symbol: Symbol, records: Vec<DailyRecord>) {
        self.series.insert(symbol, Ok(records));
    }

    /// Registers `symbol` as unreadable with the given error.
    pub fn add_failure(&mut self, symbol: Symbol, error: SourceParseError) {
        self.series.insert(symbol, Err(error));
    }
}

impl SeriesSource for InMemorySource {
    fn list_symbols(&self) -> Result<SourceListing, SourceError> {
        Ok(SourceListing {
            symbols: self.series.keys().cloned().collect(),
            ..SourceListing::default()
        })
    }

    fn read_series(
        &self,
        symbol: &Symbol,
        range: &DateRange,
    ) -> Result<Vec<DailyRecord>, SourceParseError> {
        let records = self
            .series
            .get(symbol)
            .ok_or(SourceParseError::UnknownSymbol)?
            .as_ref()
            .map_err(Clone::clone)?;

        Ok(records
            .iter()
            .filter(|record| range.contains(record.date))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calendar_year_bounds() {
        let range = DateRange::calendar_year(2023).unwrap();
        assert_eq!(range.start, date(2023, 1, 1));
        assert_eq!(range.end, date(2023, 12, 31));
        assert_eq!(range.year(), 2023);
        assert!(range.contains(date(2023, 12, 31)));
        assert!(!range.contains(date(2024, 1, 1)));
        assert!(!range.contains(date(2022, 12, 31)));
    }

    #[test]
    fn test_in_memory_source_filters_by_range() {
        let symbol = Symbol::new("TCS").unwrap();
        let mut source = InMemorySource::new();
        source.add_closes(
            symbol.clone(),
            &[
                (date(2022, 12, 30), 99.0),
                (date(2023, 1, 2), 100.0),
                (date(2023, 1, 3), 101.0),
                (date(2024, 1, 1), 102.0),
            ],
        );

        let range = DateRange::calendar_year(2023).unwrap();
        let records = source.read_series(&symbol, &range).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].close, 100.0);
        assert_eq!(records[1].close, 101.0);
        assert!(records.iter().all(|r| r.symbol == symbol));
    }

    #[test]
    fn test_in_memory_source_unknown_symbol() {
        let source = InMemorySource::new();
        let range = DateRange::calendar_year(2023).unwrap();
        let result = source.read_series(&Symbol::new("NOPE").unwrap(), &range);
        assert_eq!(result.unwrap_err(), SourceParseError::UnknownSymbol);
    }

    #[test]
    fn test_in_memory_source_registered_failure() {
        let symbol = Symbol::new("BAD").unwrap();
        let mut source = InMemorySource::new();
        source.add_failure(symbol.clone(), SourceParseError::MissingColumn("close"));

        let listing = source.list_symbols().unwrap();
        assert_eq!(listing.symbols, vec![symbol.clone()]);

        let range = DateRange::calendar_year(2023).unwrap();
        assert_eq!(
            source.read_series(&symbol, &range).unwrap_err(),
            SourceParseError::MissingColumn("close")
        );
    }

    #[test]
    fn test_parse_error_display_names_location() {
        let error = SourceParseError::InvalidDate {
            line: 7,
            value: "31/02/2023".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("31/02/2023"));
        assert!(message.contains("line 7"));
    }
}
