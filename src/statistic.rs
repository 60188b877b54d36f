//! Value-or-undefined marker for derived statistics.
//!
//! Degenerate inputs (a single observation, a zero base price) never get
//! coerced to `0.0`, `NaN` or infinity. They are carried as
//! [`Statistic::Undefined`] with the reason attached so the consuming view
//! decides how to display them.

use serde::{Serialize, Serializer};
use std::fmt;

/// Why a statistic could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Degenerate {
    /// Fewer observations than the statistic needs (e.g. std-dev of one value)
    InsufficientObservations,
    /// The denominator of a ratio is zero
    ZeroBase,
    /// The inputs have zero variance (correlation is undefined)
    ZeroVariance,
}

impl fmt::Display for Degenerate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degenerate::InsufficientObservations => write!(f, "insufficient observations"),
            Degenerate::ZeroBase => write!(f, "zero base value"),
            Degenerate::ZeroVariance => write!(f, "zero variance"),
        }
    }
}

/// A computed number, or an explicit marker that it is undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    Value(f64),
    Undefined(Degenerate),
}

impl Statistic {
    /// Returns the value if defined.
    pub fn value(&self) -> Option<f64> {
        match self {
            Statistic::Value(value) => Some(*value),
            Statistic::Undefined(_) => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Statistic::Value(_))
    }

    /// Divides `numerator` by `denominator`, undefined on a zero denominator.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            Statistic::Undefined(Degenerate::ZeroBase)
        } else {
            Statistic::Value(numerator / denominator)
        }
    }

    /// Applies `f` to a defined value, keeping the undefined reason otherwise.
    pub fn map<F>(self, f: F) -> Self
    where
        F: FnOnce(f64) -> f64,
    {
        match self {
            Statistic::Value(value) => Statistic::Value(f(value)),
            undefined => undefined,
        }
    }
}

impl From<Statistic> for Option<f64> {
    fn from(statistic: Statistic) -> Self {
        statistic.value()
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Value(value) => write!(f, "{:.2}", value),
            Statistic::Undefined(reason) => write!(f, "undefined ({})", reason),
        }
    }
}

impl Serialize for Statistic {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Statistic::Value(value) => serializer.serialize_f64(*value),
            Statistic::Undefined(_) => serializer.serialize_none(),
        }
    }
}
