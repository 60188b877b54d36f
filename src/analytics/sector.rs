//! Sector classification and per-sector average yearly return.

use crate::dataset::UnifiedDataset;
use crate::statistic::Statistic;
use crate::symbol::{Symbol, SymbolError};
use serde::Serialize;
use std::collections::BTreeMap;

/// Partial Nifty 50 classification used when no mapping is configured.
const NIFTY_SECTORS: &[(&str, &str)] = &[
    ("RELIANCE", "Energy"),
    ("TCS", "IT"),
    ("INFY", "IT"),
    ("WIPRO", "IT"),
    ("HDFCBANK", "Financials"),
    ("ICICIBANK", "Financials"),
    ("AXISBANK", "Financials"),
    ("SBIN", "Financials"),
    ("KOTAKBANK", "Financials"),
    ("HINDUNILVR", "Consumer"),
    ("ITC", "Consumer"),
    ("TITAN", "Consumer"),
    ("ONGC", "Energy"),
    ("NTPC", "Utilities"),
    ("SUNPHARMA", "Pharma"),
    ("CIPLA", "Pharma"),
    ("DRREDDY", "Pharma"),
    ("BAJFINANCE", "Financials"),
    ("ASIANPAINT", "Utilities"),
    ("BHARTIARTL", "Consumer"),
    ("TECHM", "IT"),
    ("NESTLEIND", "Consumer"),
    ("LT", "Industrials"),
    ("TATASTEEL", "Materials"),
    ("JSWSTEEL", "Materials"),
];

/// Injectable symbol-to-sector lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectorMap {
    sectors: BTreeMap<Symbol, String>,
}

impl SectorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in, deliberately incomplete Nifty 50 mapping.
    pub fn nifty_default() -> Self {
        let sectors = NIFTY_SECTORS
            .iter()
            .filter_map(|&(ticker, sector)| {
                Symbol::new(ticker)
                    .ok()
                    .map(|symbol| (symbol, sector.to_string()))
            })
            .collect();
        SectorMap { sectors }
    }

    /// Builds a mapping from raw `(ticker, sector)` pairs.
    ///
    /// # Errors
    /// Returns the first [`SymbolError`] for an invalid ticker.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, SymbolError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = SectorMap::new();
        for (ticker, sector) in entries {
            map.insert(Symbol::new(ticker)?, sector);
        }
        Ok(map)
    }

    pub fn insert(&mut self, symbol: Symbol, sector: impl Into<String>) {
        self.sectors.insert(symbol, sector.into());
    }

    pub fn sector_of(&self, symbol: &Symbol) -> Option<&str> {
        self.sectors.get(symbol).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }
}

/// Mean growth factor (`last_close / first_close`) of a sector's symbols.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorAverage {
    pub sector: String,
    pub average_return: f64,
    /// Symbols that contributed, ascending
    pub members: Vec<Symbol>,
}

/// Sector averages plus the symbols that could not take part.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectorReport {
    /// One entry per sector with at least one contributing symbol, by sector name
    pub averages: Vec<SectorAverage>,
    /// Symbols in the data with no sector mapping
    pub unmapped: Vec<Symbol>,
    /// Mapped symbols whose growth factor is undefined (zero first close)
    pub undefined: Vec<Symbol>,
}

/// Averages each mapped symbol's yearly growth factor per sector.
///
/// Sectors with no symbol present in the data do not appear. Unmapped symbols
/// are reported in [`SectorReport::unmapped`] rather than silently lost.
pub fn sector_averages(dataset: &UnifiedDataset, sectors: &SectorMap) -> SectorReport {
    let mut groups: BTreeMap<&str, Vec<(Symbol, f64)>> = BTreeMap::new();
    let mut report = SectorReport::default();

    for (symbol, records) in dataset.slices() {
        let Some(sector) = sectors.sector_of(symbol) else {
            report.unmapped.push(symbol.clone());
            continue;
        };
        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            continue;
        };
        match Statistic::ratio(last.close, first.close) {
            Statistic::Value(growth) => groups
                .entry(sector)
                .or_default()
                .push((symbol.clone(), growth)),
            Statistic::Undefined(_) => report.undefined.push(symbol.clone()),
        }
    }

    if !report.unmapped.is_empty() {
        tracing::warn!(
            "{} symbols have no sector mapping and are excluded from sector analysis",
            report.unmapped.len()
        );
    }

    report.averages = groups
        .into_iter()
        .map(|(sector, members)| {
            let average_return =
                members.iter().map(|(_, growth)| growth).sum::<f64>() / members.len() as f64;
            SectorAverage {
                sector: sector.to_string(),
                average_return,
                members: members.into_iter().map(|(symbol, _)| symbol).collect(),
            }
        })
        .collect();

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::SymbolSeries;
    use crate::time_series::DailyRecord;
    use chrono::NaiveDate;

    fn series(name: &str, first: f64, last: f64) -> SymbolSeries {
        let symbol = Symbol::new(name).unwrap();
        let records = vec![
            DailyRecord::from_close(symbol.clone(), NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(), first),
            DailyRecord::from_close(symbol.clone(), NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(), last),
        ];
        SymbolSeries { symbol, records }
    }

    fn synthetic_map() -> SectorMap {
        SectorMap::from_entries([("AAA", "Tech"), ("BBB", "Tech"), ("CCC", "Energy"), ("ZZZ", "Ghost")])
            .unwrap()
    }

    #[test]
    fn averages_growth_factor_per_sector() {
        let dataset = UnifiedDataset::build(vec![
            series("AAA", 100.0, 120.0),
            series("BBB", 50.0, 40.0),
            series("CCC", 10.0, 15.0),
        ]);
        let report = sector_averages(&dataset, &synthetic_map());

        assert_eq!(report.averages.len(), 2);
        assert_eq!(report.averages[0].sector, "Energy");
        assert!((report.averages[0].average_return - 1.5).abs() < 1e-12);
        assert_eq!(report.averages[1].sector, "Tech");
        assert!((report.averages[1].average_return - 1.0).abs() < 1e-12);
        assert_eq!(report.averages[1].members.len(), 2);
    }

    #[test]
    fn sectors_without_present_symbols_are_absent() {
        let dataset = UnifiedDataset::build(vec![series("AAA", 1.0, 2.0)]);
        let report = sector_averages(&dataset, &synthetic_map());
        assert!(report.averages.iter().all(|a| a.sector != "Ghost"));
        assert!(report.averages.iter().all(|a| a.sector != "Energy"));
    }

    #[test]
    fn unmapped_symbols_are_reported() {
        let dataset = UnifiedDataset::build(vec![
            series("AAA", 1.0, 2.0),
            series("NEW", 1.0, 3.0),
        ]);
        let report = sector_averages(&dataset, &synthetic_map());
        assert_eq!(report.unmapped, vec![Symbol::new("NEW").unwrap()]);
    }

    #[test]
    fn zero_first_close_is_excluded_from_average() {
        let dataset = UnifiedDataset::build(vec![
            series("AAA", 0.0, 2.0),
            series("BBB", 10.0, 12.0),
        ]);
        let report = sector_averages(&dataset, &synthetic_map());
        assert_eq!(report.undefined, vec![Symbol::new("AAA").unwrap()]);
        assert!((report.averages[0].average_return - 1.2).abs() < 1e-12);
    }

    #[test]
    fn nifty_default_is_partial() {
        let map = SectorMap::nifty_default();
        assert_eq!(map.len(), 25);
        assert_eq!(map.sector_of(&Symbol::new("TCS").unwrap()), Some("IT"));
        assert_eq!(map.sector_of(&Symbol::new("MARUTI").unwrap()), None);
    }

    #[test]
    fn from_entries_rejects_bad_ticker() {
        assert_eq!(
            SectorMap::from_entries([("", "IT")]).unwrap_err(),
            SymbolError::Empty
        );
    }
}
