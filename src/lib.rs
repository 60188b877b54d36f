pub mod symbol;
pub mod statistic;
pub mod time_series;
pub mod csv_source;
pub mod reader;
pub mod dataset;
pub mod analytics;
pub mod config;
pub mod pipeline;
pub mod views;

pub use symbol::{Symbol, SymbolError};
pub use statistic::{Degenerate, Statistic};
pub use time_series::{
    DailyRecord, DateRange, InMemorySource, SeriesSource, SourceError, SourceListing,
    SourceParseError,
};
pub use csv_source::{parse_daily_csv, CsvDirectorySource};
pub use reader::{read_sources, SourceBatch, SourceWarning, SymbolSeries, WarningKind};
pub use dataset::UnifiedDataset;
pub use analytics::{
    align_closes,
    correlate,
    derive_series,
    monthly_boards,
    monthly_returns,
    sector_averages,
    summarize,
    AlignedCloses,
    AlignmentError,
    CorrelationMatrix,
    DerivedSeries,
    JoinPolicy,
    MonthlyReturn,
    SectorMap,
    SectorReport,
    SymbolSummary,
};
pub use config::{ConfigError, DashboardConfig, ViewSettings};
pub use pipeline::{run, run_directory, PipelineError, PipelineOutput};
pub use views::{render, render_all, View, ViewPayload};
