//! Analytics over the unified dataset.
//!
//! The stage modules ([`summary`], [`derived`], [`monthly`], [`correlation`]
//! and [`sector`]) each take the dataset by shared reference and are
//! independent of one another. [`primitives`], [`windows`] and [`ranking`]
//! hold the numeric building blocks they share.

pub mod alignment;
pub mod correlation;
pub mod derived;
pub mod monthly;
pub mod primitives;
pub mod ranking;
pub mod sector;
pub mod summary;
pub mod windows;

pub use alignment::{align_closes, AlignedCloses, AlignmentError, JoinPolicy};
pub use correlation::{correlate, CorrelationMatrix};
pub use derived::{derive_series, most_volatile, top_performers, DerivedPoint, DerivedSeries};
pub use monthly::{monthly_boards, monthly_returns, MonthlyBoard, MonthlyReturn, YearMonth};
pub use ranking::Direction;
pub use sector::{sector_averages, SectorAverage, SectorMap, SectorReport};
pub use summary::{bottom_by_return, summarize, top_by_return, SymbolSummary};
