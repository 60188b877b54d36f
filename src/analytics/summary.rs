//! Per-symbol yearly summary.

use crate::analytics::primitives::{mean, sample_std_dev};
use crate::analytics::ranking::{top_n, Direction};
use crate::dataset::UnifiedDataset;
use crate::statistic::Statistic;
use crate::symbol::Symbol;
use crate::time_series::DailyRecord;
use serde::Serialize;

/// One row per symbol: first/last close, mean close, close volatility and
/// percent return over the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolSummary {
    pub symbol: Symbol,
    pub first_close: f64,
    pub last_close: f64,
    pub average_price: f64,
    /// Sample standard deviation of close; undefined for a single observation
    pub volatility: Statistic,
    /// `(last - first) / first * 100`; undefined when `first_close` is zero
    pub return_pct: Statistic,
    pub observations: usize,
}

impl SymbolSummary {
    /// Summarises one symbol's date-ascending records. Returns `None` for an
    /// empty slice.
    pub fn from_records(symbol: &Symbol, records: &[DailyRecord]) -> Option<Self> {
        let first = records.first()?;
        let last = records.last()?;
        let closes: Vec<f64> = records.iter().map(|r| r.close).collect();

        Some(SymbolSummary {
            symbol: symbol.clone(),
            first_close: first.close,
            last_close: last.close,
            average_price: mean(&closes).value()?,
            volatility: sample_std_dev(&closes),
            return_pct: percent_change(first.close, last.close),
            observations: records.len(),
        })
    }

    /// `last_close / first_close`, the yearly return in growth-factor form.
    pub fn growth_factor(&self) -> Statistic {
        Statistic::ratio(self.last_close, self.first_close)
    }
}

/// `(end - start) / start * 100`, undefined when `start` is zero.
pub fn percent_change(start: f64, end: f64) -> Statistic {
    Statistic::ratio(end - start, start).map(|fraction| fraction * 100.0)
}

/// Summaries for every symbol of the dataset, in symbol order.
pub fn summarize(dataset: &UnifiedDataset) -> Vec<SymbolSummary> {
    let summaries: Vec<SymbolSummary> = dataset
        .slices()
        .filter_map(|(symbol, records)| SymbolSummary::from_records(symbol, records))
        .collect();

    let undefined = summaries
        .iter()
        .filter(|s| !s.return_pct.is_defined())
        .count();
    if undefined > 0 {
        tracing::warn!("{} symbols have an undefined yearly return", undefined);
    }
    tracing::debug!("Summarised {} symbols", summaries.len());

    summaries
}

/// The `limit` best performers by `return_pct`, descending.
pub fn top_by_return(summaries: &[SymbolSummary], limit: usize) -> Vec<&SymbolSummary> {
    top_n(summaries, |s| s.return_pct, |s| &s.symbol, Direction::Descending, limit)
}

/// The `limit` worst performers by `return_pct`, ascending.
pub fn bottom_by_return(summaries: &[SymbolSummary], limit: usize) -> Vec<&SymbolSummary> {
    top_n(summaries, |s| s.return_pct, |s| &s.symbol, Direction::Ascending, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::SymbolSeries;
    use crate::statistic::Degenerate;
    use chrono::NaiveDate;

    fn series(name: &str, closes: &[f64]) -> SymbolSeries {
        let symbol = Symbol::new(name).unwrap();
        let records = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                DailyRecord::from_close(
                    symbol.clone(),
                    NaiveDate::from_ymd_opt(2023, 1, 2 + i as u32).unwrap(),
                    close,
                )
            })
            .collect();
        SymbolSeries { symbol, records }
    }

    fn approx(statistic: Statistic, expected: f64) -> bool {
        statistic
            .value()
            .map(|v| (v - expected).abs() < 1e-9)
            .unwrap_or(false)
    }

    #[test]
    fn three_symbol_reference_case() {
        let dataset = UnifiedDataset::build(vec![
            series("AAA", &[100.0, 110.0, 121.0]),
            series("BBB", &[50.0, 45.0, 40.5]),
            series("CCC", &[10.0, 10.0, 10.0]),
        ]);
        let summaries = summarize(&dataset);

        assert_eq!(summaries.len(), 3);
        assert!(approx(summaries[0].return_pct, 21.0));
        assert!(approx(summaries[1].return_pct, -19.0));
        assert!(approx(summaries[2].return_pct, 0.0));
        assert_eq!(summaries[2].volatility, Statistic::Value(0.0));
        assert_eq!(summaries[0].first_close, 100.0);
        assert_eq!(summaries[0].last_close, 121.0);
    }

    #[test]
    fn first_and_last_follow_date_order_not_input_order() {
        let symbol = Symbol::new("AAA").unwrap();
        let d = |day| NaiveDate::from_ymd_opt(2023, 2, day).unwrap();
        let shuffled = SymbolSeries {
            symbol: symbol.clone(),
            records: vec![
                DailyRecord::from_close(symbol.clone(), d(9), 130.0),
                DailyRecord::from_close(symbol.clone(), d(1), 100.0),
                DailyRecord::from_close(symbol.clone(), d(5), 90.0),
            ],
        };
        let summaries = summarize(&UnifiedDataset::build(vec![shuffled]));
        assert_eq!(summaries[0].first_close, 100.0);
        assert_eq!(summaries[0].last_close, 130.0);
    }

    #[test]
    fn single_observation_symbol() {
        let summaries = summarize(&UnifiedDataset::build(vec![series("ONE", &[42.0])]));
        let summary = &summaries[0];
        assert_eq!(summary.average_price, 42.0);
        assert_eq!(
            summary.volatility,
            Statistic::Undefined(Degenerate::InsufficientObservations)
        );
        assert_eq!(summary.return_pct, Statistic::Value(0.0));
    }

    #[test]
    fn zero_first_close_marks_return_undefined() {
        let summaries = summarize(&UnifiedDataset::build(vec![series("ZERO", &[0.0, 5.0])]));
        assert_eq!(
            summaries[0].return_pct,
            Statistic::Undefined(Degenerate::ZeroBase)
        );
        assert!(!summaries[0].growth_factor().is_defined());
    }

    #[test]
    fn top_and_bottom_rankings() {
        let dataset = UnifiedDataset::build(vec![
            series("AAA", &[100.0, 121.0]),
            series("BBB", &[50.0, 40.5]),
            series("CCC", &[10.0, 10.0]),
            series("DDD", &[200.0, 242.0]),
        ]);
        let summaries = summarize(&dataset);

        let top: Vec<&str> = top_by_return(&summaries, 2)
            .into_iter()
            .map(|s| s.symbol.as_str())
            .collect();
        // AAA and DDD both return 21%; tie broken by symbol.
        assert_eq!(top, vec!["AAA", "DDD"]);

        let bottom: Vec<&str> = bottom_by_return(&summaries, 2)
            .into_iter()
            .map(|s| s.symbol.as_str())
            .collect();
        assert_eq!(bottom, vec!["BBB", "CCC"]);
    }
}
