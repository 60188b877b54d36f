//! Cross-symbol alignment of close prices on a common date key.
//!
//! Symbols are folded into a wide table one keyed join at a time. The join
//! policy is explicit: [`JoinPolicy::Inner`] keeps only dates every symbol
//! traded (what correlation needs), [`JoinPolicy::Outer`] keeps the union and
//! leaves gaps as `None`.

use crate::dataset::UnifiedDataset;
use crate::symbol::Symbol;
use crate::time_series::DailyRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Intersection of all calendars
    Inner,
    /// Union of all calendars, missing closes as `None`
    Outer,
}

/// Date-indexed wide table of closes, one column per symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedCloses {
    pub policy: JoinPolicy,
    /// Column order
    pub symbols: Vec<Symbol>,
    /// Row index, ascending
    pub dates: Vec<NaiveDate>,
    /// `rows[i][j]` is the close of `symbols[j]` on `dates[i]`
    pub rows: Vec<Vec<Option<f64>>>,
}

impl AlignedCloses {
    /// The close column of symbol index `column`, or `None` when the index
    /// is out of range.
    pub fn column(&self, column: usize) -> Option<Vec<Option<f64>>> {
        if column >= self.symbols.len() {
            return None;
        }
        self.rows
            .iter()
            .map(|row| row.get(column).copied())
            .collect()
    }

    fn from_column(policy: JoinPolicy, symbol: Symbol, closes: BTreeMap<NaiveDate, f64>) -> Self {
        let (dates, rows) = closes
            .into_iter()
            .map(|(date, close)| (date, vec![Some(close)]))
            .unzip();
        AlignedCloses {
            policy,
            symbols: vec![symbol],
            dates,
            rows,
        }
    }

    /// Joins one more symbol's closes on the date key.
    fn join(self, symbol: Symbol, closes: &BTreeMap<NaiveDate, f64>) -> Self {
        let width = self.symbols.len();
        let mut table: BTreeMap<NaiveDate, Vec<Option<f64>>> =
            self.dates.into_iter().zip(self.rows).collect();

        match self.policy {
            JoinPolicy::Inner => {
                table.retain(|date, _| closes.contains_key(date));
                for (date, row) in table.iter_mut() {
                    row.push(closes.get(date).copied());
                }
            }
            JoinPolicy::Outer => {
                for (date, row) in table.iter_mut() {
                    row.push(closes.get(date).copied());
                }
                for (date, close) in closes {
                    table.entry(*date).or_insert_with(|| {
                        let mut row = vec![None; width];
                        row.push(Some(*close));
                        row
                    });
                }
            }
        }

        let mut symbols = self.symbols;
        symbols.push(symbol);
        let (dates, rows) = table.into_iter().unzip();
        AlignedCloses {
            policy: self.policy,
            symbols,
            dates,
            rows,
        }
    }
}

/// Failures of the aligner. These never abort the rest of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    /// The dataset has no symbols to align
    NoSymbols,
    /// The symbols share no common date
    EmptyAlignment { symbols: usize },
}

impl fmt::Display for AlignmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentError::NoSymbols => write!(f, "No symbols to align"),
            AlignmentError::EmptyAlignment { symbols } => write!(
                f,
                "The {} symbols have no trading date in common",
                symbols
            ),
        }
    }
}

impl std::error::Error for AlignmentError {}

fn close_map(records: &[DailyRecord]) -> BTreeMap<NaiveDate, f64> {
    records.iter().map(|r| (r.date, r.close)).collect()
}

/// Builds the wide close table of every symbol in the dataset.
///
/// # Errors
/// * [`AlignmentError::NoSymbols`] for an empty dataset
/// * [`AlignmentError::EmptyAlignment`] when an inner join leaves no dates
pub fn align_closes(
    dataset: &UnifiedDataset,
    policy: JoinPolicy,
) -> Result<AlignedCloses, AlignmentError> {
    let mut slices = dataset.slices();
    let (first_symbol, first_records) = slices.next().ok_or(AlignmentError::NoSymbols)?;

    let mut aligned =
        AlignedCloses::from_column(policy, first_symbol.clone(), close_map(first_records));
    for (symbol, records) in slices {
        let before = aligned.dates.len();
        aligned = aligned.join(symbol.clone(), &close_map(records));
        if aligned.dates.len() < before {
            tracing::debug!(
                "Joining {} reduced the common calendar from {} to {} dates",
                symbol,
                before,
                aligned.dates.len()
            );
        }
    }

    if aligned.dates.is_empty() {
        return Err(AlignmentError::EmptyAlignment {
            symbols: aligned.symbols.len(),
        });
    }

    tracing::info!(
        "Aligned {} symbols on {} dates ({:?} join)",
        aligned.symbols.len(),
        aligned.dates.len(),
        policy
    );
    Ok(aligned)
}
