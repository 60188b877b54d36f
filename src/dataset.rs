//! Unified long-form dataset: every symbol's records in one sequence.

use crate::reader::SymbolSeries;
use crate::symbol::Symbol;
use crate::time_series::DailyRecord;

/// All records of a run, sorted by `(symbol, date)`.
///
/// Built once and never mutated; analytics read it through [`UnifiedDataset::slices`],
/// which yields each symbol's records as a separate slice so computations that
/// look at consecutive rows never straddle two symbols.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedDataset {
    records: Vec<DailyRecord>,
}

impl UnifiedDataset {
    /// Concatenates the per-symbol series and stable-sorts by `(symbol, date)`.
    ///
    /// Series may have different lengths and date coverage. No record is
    /// dropped or duplicated.
    pub fn build(series: Vec<SymbolSeries>) -> Self {
        let mut records: Vec<DailyRecord> =
            series.into_iter().flat_map(|s| s.records).collect();
        records.sort_by(|a, b| a.symbol.cmp(&b.symbol).then(a.date.cmp(&b.date)));

        tracing::debug!("Unified dataset built with {} records", records.len());

        UnifiedDataset { records }
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over `(symbol, records)` groups in symbol order.
    pub fn slices(&self) -> SymbolSlices<'_> {
        SymbolSlices {
            remaining: &self.records,
        }
    }

    /// Distinct symbols in ascending order.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.slices().map(|(symbol, _)| symbol.clone()).collect()
    }

    /// The records of one symbol, date-ascending.
    pub fn slice_for(&self, symbol: &Symbol) -> Option<&[DailyRecord]> {
        self.slices()
            .find(|(candidate, _)| *candidate == symbol)
            .map(|(_, records)| records)
    }
}

/// Iterator over contiguous per-symbol runs of a [`UnifiedDataset`].
pub struct SymbolSlices<'a> {
    remaining: &'a [DailyRecord],
}

impl<'a> Iterator for SymbolSlices<'a> {
    type Item = (&'a Symbol, &'a [DailyRecord]);

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.remaining.first()?;
        let end = self
            .remaining
            .iter()
            .position(|record| record.symbol != first.symbol)
            .unwrap_or(self.remaining.len());
        let (slice, rest) = self.remaining.split_at(end);
        self.remaining = rest;
        Some((&first.symbol, slice))
    }
}
