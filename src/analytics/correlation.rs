//! Pairwise correlation of daily returns over the aligned calendar.

use crate::analytics::alignment::{align_closes, AlignedCloses, AlignmentError, JoinPolicy};
use crate::analytics::primitives::{pearson, simple_return};
use crate::dataset::UnifiedDataset;
use crate::statistic::Statistic;
use crate::symbol::Symbol;
use serde::Serialize;

/// Symmetric symbol-by-symbol matrix of return correlations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    /// Row and column order
    pub symbols: Vec<Symbol>,
    /// Number of aligned return rows the matrix was computed from
    pub observations: usize,
    pub values: Vec<Vec<Statistic>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, column: usize) -> Option<Statistic> {
        self.values.get(row)?.get(column).copied()
    }

    pub fn index_of(&self, symbol: &Symbol) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Correlation between two symbols by name.
    pub fn between(&self, a: &Symbol, b: &Symbol) -> Option<Statistic> {
        self.get(self.index_of(a)?, self.index_of(b)?)
    }
}

/// Percent change of each column between consecutive aligned rows.
///
/// The first row has no predecessor and is dropped. A change is `None` when
/// either close is missing or the previous close is zero.
pub fn aligned_returns(aligned: &AlignedCloses) -> Vec<Vec<Option<f64>>> {
    aligned
        .rows
        .windows(2)
        .map(|pair| {
            pair[0]
                .iter()
                .zip(&pair[1])
                .map(|(previous, current)| match (previous, current) {
                    (Some(p), Some(c)) => simple_return(*c, *p).value(),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

/// Pearson correlation for every pair of columns of the aligned table.
///
/// Each pair uses the rows where both returns are defined. The diagonal is
/// `1.0` and `(i, j)` equals `(j, i)` by construction.
pub fn correlation_matrix(aligned: &AlignedCloses) -> CorrelationMatrix {
    let returns = aligned_returns(aligned);
    let n = aligned.symbols.len();
    let mut values = vec![vec![Statistic::Value(1.0); n]; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let (x, y): (Vec<f64>, Vec<f64>) = returns
                .iter()
                .filter_map(|row| Some((row[i]?, row[j]?)))
                .unzip();
            let correlation = pearson(&x, &y);
            values[i][j] = correlation;
            values[j][i] = correlation;
        }
    }

    CorrelationMatrix {
        symbols: aligned.symbols.clone(),
        observations: returns.len(),
        values,
    }
}

/// Inner-joins every symbol's closes and correlates their daily returns.
///
/// # Errors
/// Propagates [`AlignmentError`] when the symbols share no date.
pub fn correlate(dataset: &UnifiedDataset) -> Result<CorrelationMatrix, AlignmentError> {
    let aligned = align_closes(dataset, JoinPolicy::Inner)?;
    let matrix = correlation_matrix(&aligned);
    tracing::debug!(
        "Correlation matrix {}x{} from {} return rows",
        matrix.symbols.len(),
        matrix.symbols.len(),
        matrix.observations
    );
    Ok(matrix)
}
