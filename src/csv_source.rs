//! CSV directory source: one `<SYMBOL>.csv` file per equity.

use crate::symbol::Symbol;
use crate::time_series::{
    DailyRecord, DateRange, SeriesSource, SourceError, SourceListing, SourceParseError,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"];

/// Reads per-symbol daily series from a directory of CSV files.
///
/// The directory is scanned once when the source is opened. Every regular
/// file with a `csv` extension (any case) becomes a symbol named after its
/// upper-cased stem.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
    files: BTreeMap<Symbol, PathBuf>,
    rejected: Vec<String>,
    duplicates: Vec<String>,
}

impl CsvDirectorySource {
    /// Scans `dir` for CSV files.
    ///
    /// # Errors
    /// Returns [`SourceError::DirectoryUnreadable`] when the directory cannot
    /// be listed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let dir = dir.into();
        let entries = fs::read_dir(&dir)
            .map_err(|e| SourceError::DirectoryUnreadable(format!("{}: {}", dir.display(), e)))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_csv_extension(path))
            .collect();
        paths.sort();

        let mut files = BTreeMap::new();
        let mut rejected = Vec::new();
        let mut duplicates = Vec::new();
        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match Symbol::from_path(&path) {
                // Same symbol under a different file-name case; the first path in sort order wins.
                Ok(symbol) if files.contains_key(&symbol) => duplicates.push(name),
                Ok(symbol) => {
                    files.insert(symbol, path);
                }
                Err(_) => rejected.push(name),
            }
        }

        tracing::debug!(
            "Scanned {}: {} symbol files, {} rejected names, {} duplicates",
            dir.display(),
            files.len(),
            rejected.len(),
            duplicates.len()
        );

        Ok(CsvDirectorySource {
            dir,
            files,
            rejected,
            duplicates,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `symbol`, if any.
    pub fn path_for(&self, symbol: &Symbol) -> Option<&Path> {
        self.files.get(symbol).map(PathBuf::as_path)
    }
}

impl SeriesSource for CsvDirectorySource {
    fn list_symbols(&self) -> Result<SourceListing, SourceError> {
        Ok(SourceListing {
            symbols: self.files.keys().cloned().collect(),
            rejected: self.rejected.clone(),
            duplicates: self.duplicates.clone(),
        })
    }

    fn read_series(
        &self,
        symbol: &Symbol,
        range: &DateRange,
    ) -> Result<Vec<DailyRecord>, SourceParseError> {
        let path = self
            .files
            .get(symbol)
            .ok_or(SourceParseError::UnknownSymbol)?;
        let file = fs::File::open(path).map_err(|e| SourceParseError::Io(e.to_string()))?;
        parse_daily_csv(file, symbol, range)
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, SourceParseError> {
        let find = |name: &str| {
            headers.iter().position(|header| {
                header
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .eq_ignore_ascii_case(name)
            })
        };

        Ok(Columns {
            date: find("date").ok_or(SourceParseError::MissingColumn("date"))?,
            close: find("close").ok_or(SourceParseError::MissingColumn("close"))?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            volume: find("volume"),
        })
    }
}

/// Parses daily OHLC rows for `symbol` from CSV text, keeping rows inside `range`.
///
/// The date and close of every row are validated, including rows outside the
/// range, so a malformed file fails as a whole. Duplicate dates only matter
/// inside the range; unusable open, high, low or volume cells become `None`.
pub fn parse_daily_csv<R: Read>(
    input: R,
    symbol: &Symbol,
    range: &DateRange,
) -> Result<Vec<DailyRecord>, SourceParseError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(input);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        let date_cell = row.get(columns.date).unwrap_or("");
        let date = parse_date(date_cell).ok_or_else(|| SourceParseError::InvalidDate {
            line,
            value: date_cell.to_string(),
        })?;

        let close = close_cell(&row, columns.close, line)?;
        if !range.contains(date) {
            continue;
        }
        if !seen.insert(date) {
            return Err(SourceParseError::DuplicateDate(date));
        }

        records.push(DailyRecord {
            symbol: symbol.clone(),
            date,
            open: passthrough_price(&row, columns.open),
            high: passthrough_price(&row, columns.high),
            low: passthrough_price(&row, columns.low),
            close,
            volume: passthrough_volume(&row, columns.volume),
        });
    }

    Ok(records)
}

fn csv_error(error: csv::Error) -> SourceParseError {
    let line = error.position().map(|p| p.line()).unwrap_or(0);
    SourceParseError::Csv {
        line,
        message: error.to_string(),
    }
}

/// Parses a calendar date from the formats seen in exported price files.
///
/// Timestamps with an offset keep the local date as written.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Some(datetime.date());
        }
    }
    for format in OFFSET_FORMATS {
        if let Ok(datetime) = DateTime::parse_from_str(value, format) {
            return Some(datetime.date_naive());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|datetime| datetime.date_naive())
}

fn close_cell(row: &StringRecord, index: usize, line: u64) -> Result<f64, SourceParseError> {
    let cell = row.get(index).unwrap_or("");
    let value: f64 = cell.parse().map_err(|_| SourceParseError::InvalidNumber {
        line,
        column: "close",
        value: cell.to_string(),
    })?;

    if !value.is_finite() || value < 0.0 {
        return Err(SourceParseError::InvalidPrice {
            line,
            column: "close",
            value: cell.to_string(),
        });
    }
    Ok(value)
}

fn non_empty_cell(row: &StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|i| row.get(i))
        .filter(|cell| !cell.is_empty())
}

/// Open, high and low are carried along but never analysed; an unusable cell
/// becomes `None` instead of failing the file.
fn passthrough_price(row: &StringRecord, index: Option<usize>) -> Option<f64> {
    non_empty_cell(row, index)
        .and_then(|cell| cell.parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
}

fn passthrough_volume(row: &StringRecord, index: Option<usize>) -> Option<u64> {
    let cell = non_empty_cell(row, index)?;
    if let Ok(volume) = cell.parse::<u64>() {
        return Some(volume);
    }

    // Some exports write volume as a float ("12345.0").
    cell.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0 && value.fract() == 0.0)
        .map(|value| value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year_2023() -> DateRange {
        DateRange::calendar_year(2023).unwrap()
    }

    fn parse(text: &str) -> Result<Vec<DailyRecord>, SourceParseError> {
        parse_daily_csv(text.as_bytes(), &Symbol::new("TCS").unwrap(), &year_2023())
    }

    #[test]
    fn parses_full_ohlcv_rows() {
        let records = parse(
            "date,open,high,low,close,volume\n\
             2023-01-02,100,105,99,104,1500\n\
             2023-01-03,104,106,101,102.5,1200\n",
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
        assert_eq!(records[0].open, Some(100.0));
        assert_eq!(records[0].close, 104.0);
        assert_eq!(records[1].close, 102.5);
        assert_eq!(records[1].volume, Some(1200));
        assert_eq!(records[1].symbol.as_str(), "TCS");
    }

    #[test]
    fn only_date_and_close_are_required() {
        let records = parse("Date,Close\n2023-03-01,50\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].open, None);
        assert_eq!(records[0].volume, None);
    }

    #[test]
    fn header_matching_ignores_case_and_padding() {
        let records = parse(" DATE , CLOSE \n2023-03-01,50\n").unwrap();
        assert_eq!(records[0].close, 50.0);
    }

    #[test]
    fn missing_close_column_is_reported() {
        let error = parse("date,open\n2023-01-02,10\n").unwrap_err();
        assert_eq!(error, SourceParseError::MissingColumn("close"));
    }

    #[test]
    fn malformed_date_fails_the_file() {
        let error = parse("date,close\n2023-01-02,10\nnot-a-date,11\n").unwrap_err();
        assert!(matches!(error, SourceParseError::InvalidDate { line: 3, .. }));
    }

    #[test]
    fn rows_outside_target_year_are_discarded() {
        let records = parse(
            "date,close\n\
             2022-12-30,9\n\
             2023-01-02,10\n\
             2024-01-01,11\n",
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].close, 10.0);
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let error = parse("date,close\n2023-01-02,10\n2023-01-02,11\n").unwrap_err();
        assert_eq!(
            error,
            SourceParseError::DuplicateDate(NaiveDate::from_ymd_opt(2023, 1, 2).unwrap())
        );
    }

    #[test]
    fn duplicate_dates_outside_target_year_are_ignored() {
        let records = parse(
            "date,close\n\
             2019-05-01,7\n\
             2019-05-01,8\n\
             2023-01-02,10\n\
             2023-01-03,11\n",
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].close, 10.0);
    }

    #[test]
    fn unusable_passthrough_cells_become_none() {
        let records = parse(
            "date,open,high,low,close,volume\n\
             2023-01-02,-1,abc,inf,10,-5\n\
             2023-01-03,10,12,,11,2.5\n",
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].open, None);
        assert_eq!(records[0].high, None);
        assert_eq!(records[0].low, None);
        assert_eq!(records[0].close, 10.0);
        assert_eq!(records[0].volume, None);
        assert_eq!(records[1].open, Some(10.0));
        assert_eq!(records[1].low, None);
        assert_eq!(records[1].volume, None);
    }

    #[test]
    fn negative_price_is_rejected_but_zero_is_kept() {
        let error = parse("date,close\n2023-01-02,-1\n").unwrap_err();
        assert!(matches!(error, SourceParseError::InvalidPrice { column: "close", .. }));

        let records = parse("date,close\n2023-01-02,0\n").unwrap();
        assert_eq!(records[0].close, 0.0);
    }

    #[test]
    fn empty_close_cell_is_invalid() {
        let error = parse("date,close\n2023-01-02,\n").unwrap_err();
        assert!(matches!(error, SourceParseError::InvalidNumber { column: "close", .. }));
    }

    #[test]
    fn float_volume_is_accepted() {
        let records = parse("date,close,volume\n2023-01-02,10,2500.0\n").unwrap();
        assert_eq!(records[0].volume, Some(2500));
    }

    #[test]
    fn parse_date_accepts_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2023, 5, 17);
        assert_eq!(parse_date("2023-05-17"), expected);
        assert_eq!(parse_date("2023-05-17 09:15:00"), expected);
        assert_eq!(parse_date("2023-05-17 00:00:00+05:30"), expected);
        assert_eq!(parse_date("2023-05-17T00:00:00+05:30"), expected);
        assert_eq!(parse_date("17th May"), None);
    }

    #[test]
    fn open_indexes_csv_files_by_symbol() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tcs.csv"), "date,close\n2023-01-02,10\n").unwrap();
        fs::write(dir.path().join("INFY.CSV"), "date,close\n2023-01-02,20\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("bad name.csv"), "date,close\n").unwrap();

        let source = CsvDirectorySource::open(dir.path()).unwrap();
        let listing = source.list_symbols().unwrap();
        let names: Vec<&str> = listing.symbols.iter().map(Symbol::as_str).collect();
        assert_eq!(names, vec!["INFY", "TCS"]);
        assert_eq!(listing.rejected, vec!["bad name.csv".to_string()]);
        assert!(listing.duplicates.is_empty());

        let records = source
            .read_series(&Symbol::new("TCS").unwrap(), &year_2023())
            .unwrap();
        assert_eq!(records[0].close, 10.0);
    }

    #[test]
    fn open_reports_case_variant_duplicates_separately() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("TCS.csv"), "date,close\n2023-01-02,10\n").unwrap();
        fs::write(dir.path().join("tcs.csv"), "date,close\n2023-01-02,99\n").unwrap();

        let source = CsvDirectorySource::open(dir.path()).unwrap();
        let listing = source.list_symbols().unwrap();
        assert_eq!(listing.symbols, vec![Symbol::new("TCS").unwrap()]);
        assert!(listing.rejected.is_empty());
        assert_eq!(listing.duplicates, vec!["tcs.csv".to_string()]);
        assert_eq!(
            source.path_for(&Symbol::new("TCS").unwrap()),
            Some(dir.path().join("TCS.csv").as_path())
        );
    }

    #[test]
    fn open_fails_on_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            CsvDirectorySource::open(missing),
            Err(SourceError::DirectoryUnreadable(_))
        ));
    }
}
