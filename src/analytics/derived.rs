//! Per-symbol derived series: daily return, cumulative return and the
//! return-volatility measures built on them.
//!
//! Every computation runs over a single symbol's date-ordered slice of the
//! [`UnifiedDataset`], so the last row of one symbol is never treated as the
//! predecessor of the next symbol's first row.

use crate::analytics::primitives::{sample_std_dev, simple_return};
use crate::analytics::ranking::{top_n, Direction};
use crate::analytics::windows::FixedWindow;
use crate::dataset::UnifiedDataset;
use crate::statistic::Statistic;
use crate::symbol::Symbol;
use crate::time_series::DailyRecord;
use chrono::NaiveDate;
use serde::Serialize;

/// Derived values for one date that has a predecessor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedPoint {
    pub date: NaiveDate,
    /// `close[t] / close[t-1] - 1`
    pub daily_return: Statistic,
    /// `close[t] / close[first]`
    pub cumulative_return: Statistic,
}

/// A symbol's derived series. `points` starts at the second observation; the
/// first observation is kept as the base the cumulative return is rebased to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSeries {
    pub symbol: Symbol,
    pub base_date: NaiveDate,
    pub base_close: f64,
    pub points: Vec<DerivedPoint>,
}

impl DerivedSeries {
    /// Builds the series from date-ascending records of one symbol.
    ///
    /// Returns `None` when there are fewer than two records, since no row
    /// would have a predecessor.
    pub fn from_records(symbol: &Symbol, records: &[DailyRecord]) -> Option<Self> {
        if records.len() < 2 {
            return None;
        }
        let base = &records[0];

        let points = records
            .windows(2)
            .map(|pair| DerivedPoint {
                date: pair[1].date,
                daily_return: simple_return(pair[1].close, pair[0].close),
                cumulative_return: Statistic::ratio(pair[1].close, base.close),
            })
            .collect();

        Some(DerivedSeries {
            symbol: symbol.clone(),
            base_date: base.date,
            base_close: base.close,
            points,
        })
    }

    /// Defined daily returns in date order.
    pub fn daily_returns(&self) -> Vec<f64> {
        self.points
            .iter()
            .filter_map(|p| p.daily_return.value())
            .collect()
    }

    /// Cumulative return at every date including the base date, which is 1.0.
    pub fn cumulative_trajectory(&self) -> Vec<(NaiveDate, Statistic)> {
        std::iter::once((
            self.base_date,
            Statistic::ratio(self.base_close, self.base_close),
        ))
        .chain(self.points.iter().map(|p| (p.date, p.cumulative_return)))
        .collect()
    }

    /// Cumulative return at the last date.
    pub fn final_cumulative_return(&self) -> Statistic {
        self.points
            .last()
            .map(|p| p.cumulative_return)
            .unwrap_or_else(|| Statistic::ratio(self.base_close, self.base_close))
    }

    /// Sample standard deviation of the defined daily returns.
    pub fn return_volatility(&self) -> Statistic {
        sample_std_dev(&self.daily_returns())
    }

    /// Sample std-dev of the trailing `window` daily returns at each date.
    ///
    /// Early dates use however many returns are available; a window holding
    /// fewer than two defined returns is undefined.
    pub fn rolling_return_volatility(&self, window: usize) -> Vec<(NaiveDate, Statistic)> {
        let returns: Vec<Statistic> = self.points.iter().map(|p| p.daily_return).collect();
        let volatility = FixedWindow::new(window).apply(&returns, |slice| {
            let defined: Vec<f64> = slice.iter().filter_map(Statistic::value).collect();
            sample_std_dev(&defined)
        });

        self.points
            .iter()
            .map(|p| p.date)
            .zip(volatility)
            .collect()
    }
}

/// Derived series for every symbol with at least two observations, in symbol order.
pub fn derive_series(dataset: &UnifiedDataset) -> Vec<DerivedSeries> {
    let series: Vec<DerivedSeries> = dataset
        .slices()
        .filter_map(|(symbol, records)| DerivedSeries::from_records(symbol, records))
        .collect();

    tracing::debug!("Derived return series for {} symbols", series.len());
    series
}

/// The `limit` symbols with the highest final cumulative return.
pub fn top_performers(series: &[DerivedSeries], limit: usize) -> Vec<&DerivedSeries> {
    top_n(
        series,
        DerivedSeries::final_cumulative_return,
        |s| &s.symbol,
        Direction::Descending,
        limit,
    )
}

/// The `limit` symbols with the highest daily-return volatility.
pub fn most_volatile(series: &[DerivedSeries], limit: usize) -> Vec<&DerivedSeries> {
    top_n(
        series,
        DerivedSeries::return_volatility,
        |s| &s.symbol,
        Direction::Descending,
        limit,
    )
}
