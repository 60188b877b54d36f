//! Deterministic ranking helpers.
//!
//! Every board in the dashboard (top/bottom N by return, most volatile,
//! monthly gainers/losers) ranks by one numeric key. Ties are broken by
//! symbol ascending so output never depends on input order.

use crate::statistic::Statistic;
use crate::symbol::Symbol;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Largest value first
    Descending,
    /// Smallest value first
    Ascending,
}

/// Sorts all items by `key`, defined values first in `direction`, then the
/// undefined ones by symbol.
pub fn sort_by_key<'a, T, K, S>(items: &'a [T], key: K, symbol: S, direction: Direction) -> Vec<&'a T>
where
    K: Fn(&T) -> Statistic,
    S: Fn(&T) -> &Symbol,
{
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by(|a, b| {
        let by_value = match (key(*a).value(), key(*b).value()) {
            (Some(x), Some(y)) => {
                let ascending = OrderedFloat(x).cmp(&OrderedFloat(y));
                match direction {
                    Direction::Ascending => ascending,
                    Direction::Descending => ascending.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_value.then_with(|| symbol(*a).cmp(symbol(*b)))
    });
    sorted
}

/// The first `limit` items with a defined `key`, ranked in `direction`.
pub fn top_n<'a, T, K, S>(
    items: &'a [T],
    key: K,
    symbol: S,
    direction: Direction,
    limit: usize,
) -> Vec<&'a T>
where
    K: Fn(&T) -> Statistic,
    S: Fn(&T) -> &Symbol,
{
    sort_by_key(items, &key, symbol, direction)
        .into_iter()
        .filter(|item| key(*item).is_defined())
        .take(limit)
        .collect()
}
