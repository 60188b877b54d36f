//! Calendar-month bucketing and the monthly gainer/loser boards.

use crate::analytics::ranking::{top_n, Direction};
use crate::dataset::UnifiedDataset;
use crate::statistic::Statistic;
use crate::symbol::Symbol;
use crate::time_series::DailyRecord;
use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A calendar month bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Return of one symbol over one month, first to last trading day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReturn {
    pub symbol: Symbol,
    pub month: YearMonth,
    /// `(last - first) / first` as a fraction; `0.0` for a single-record month
    pub value: Statistic,
}

/// Monthly returns for every `(symbol, month)` pair with at least one record,
/// ordered by symbol then month.
pub fn monthly_returns(dataset: &UnifiedDataset) -> Vec<MonthlyReturn> {
    let mut returns = Vec::new();
    for (symbol, records) in dataset.slices() {
        for bucket in records.chunk_by(|a, b| YearMonth::of(a.date) == YearMonth::of(b.date)) {
            returns.push(bucket_return(symbol, bucket));
        }
    }
    returns
}

/// Records are date-ascending within a symbol slice, so the bucket's first and
/// last elements are its first and last trading days.
fn bucket_return(symbol: &Symbol, bucket: &[DailyRecord]) -> MonthlyReturn {
    let first = &bucket[0];
    let last = &bucket[bucket.len() - 1];
    MonthlyReturn {
        symbol: symbol.clone(),
        month: YearMonth::of(first.date),
        value: Statistic::ratio(last.close - first.close, first.close),
    }
}

/// Top gainers and losers of one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBoard {
    pub month: YearMonth,
    /// Highest returns first
    pub gainers: Vec<MonthlyReturn>,
    /// Lowest returns first
    pub losers: Vec<MonthlyReturn>,
}

/// One board per month present in `returns`, months ascending.
///
/// Undefined returns are left off both sides of a board.
pub fn monthly_boards(returns: &[MonthlyReturn], limit: usize) -> Vec<MonthlyBoard> {
    let mut by_month: BTreeMap<YearMonth, Vec<MonthlyReturn>> = BTreeMap::new();
    for entry in returns {
        by_month.entry(entry.month).or_default().push(entry.clone());
    }

    by_month
        .into_iter()
        .map(|(month, entries)| {
            let rank = |direction| -> Vec<MonthlyReturn> {
                top_n(&entries, |e| e.value, |e| &e.symbol, direction, limit)
                    .into_iter()
                    .cloned()
                    .collect()
            };
            MonthlyBoard {
                month,
                gainers: rank(Direction::Descending),
                losers: rank(Direction::Ascending),
            }
        })
        .collect()
}
