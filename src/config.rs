//! Run configuration: data location, target year, worker bound, sector
//! mapping and view sizes.

use crate::analytics::sector::SectorMap;
use crate::time_series::DateRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_DATA_DIR: &str = "DASHBOARD_DATA_DIR";
pub const ENV_YEAR: &str = "DASHBOARD_YEAR";
pub const ENV_WORKERS: &str = "DASHBOARD_WORKERS";
pub const ENV_SECTORS: &str = "DASHBOARD_SECTORS";

/// Sizes and thresholds used by the view adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Rows in the top / bottom return tables
    pub ranking_size: usize,
    /// Bars in the volatility chart
    pub volatility_board_size: usize,
    /// Lines in the cumulative return chart
    pub top_performers: usize,
    /// Gainers and losers shown per month
    pub monthly_board_size: usize,
    /// Percent return above which a symbol is a consistent gainer
    pub gain_threshold_pct: f64,
    /// Percent return below which a symbol is a significant decliner
    pub loss_threshold_pct: f64,
    /// Trailing window, in returns, for rolling volatility
    pub rolling_window: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        ViewSettings {
            ranking_size: 10,
            volatility_board_size: 10,
            top_performers: 5,
            monthly_board_size: 5,
            gain_threshold_pct: 20.0,
            loss_threshold_pct: -20.0,
            rolling_window: 20,
        }
    }
}

/// Configuration of one dashboard run.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Directory holding one `<SYMBOL>.csv` per symbol
    pub data_dir: PathBuf,
    pub target_year: i32,
    /// Upper bound on concurrent symbol reads
    pub max_workers: usize,
    pub sectors: SectorMap,
    pub views: ViewSettings,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_dir: PathBuf::from("nifty_50"),
            target_year: 2023,
            max_workers: default_workers(),
            sectors: SectorMap::nifty_default(),
            views: ViewSettings::default(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl DashboardConfig {
    /// Creates a configuration for `data_dir` with every other field defaulted.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        DashboardConfig {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Reads overrides from the process environment.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `DASHBOARD_DATA_DIR` | `data_dir` |
    /// | `DASHBOARD_YEAR` | `target_year` |
    /// | `DASHBOARD_WORKERS` | `max_workers` |
    /// | `DASHBOARD_SECTORS` | `sectors`, path to a JSON object of ticker to sector |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DashboardConfig::from_env`] with an explicit variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = DashboardConfig::default();

        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(year) = lookup(ENV_YEAR) {
            config.target_year = year
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidYear(year.clone()))?;
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            config.max_workers = workers
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidWorkers(workers.clone()))?;
        }
        if let Some(path) = lookup(ENV_SECTORS) {
            config.sectors = load_sector_map(Path::new(&path))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the year is a four-digit calendar year and at least one worker is allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1900..=9999).contains(&self.target_year) {
            return Err(ConfigError::InvalidYear(self.target_year.to_string()));
        }
        if self.max_workers == 0 {
            return Err(ConfigError::InvalidWorkers(self.max_workers.to_string()));
        }
        Ok(())
    }

    /// The calendar-year window of `target_year`.
    pub fn date_range(&self) -> Result<DateRange, ConfigError> {
        DateRange::calendar_year(self.target_year)
            .ok_or_else(|| ConfigError::InvalidYear(self.target_year.to_string()))
    }
}

/// Loads a sector mapping from a JSON object such as `{"TCS": "IT"}`.
pub fn load_sector_map(path: &Path) -> Result<SectorMap, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_sector_map(&contents).map_err(|message| ConfigError::Json {
        path: path.to_path_buf(),
        message,
    })
}

/// Parses a JSON object of ticker to sector name.
pub fn parse_sector_map(json: &str) -> Result<SectorMap, String> {
    let entries: BTreeMap<String, String> =
        serde_json::from_str(json).map_err(|e| e.to_string())?;
    SectorMap::from_entries(entries).map_err(|e| e.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidYear(String),
    InvalidWorkers(String),
    Io { path: PathBuf, message: String },
    Json { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidYear(value) => {
                write!(f, "Invalid target year '{}': expected 1900-9999", value)
            }
            ConfigError::InvalidWorkers(value) => {
                write!(f, "Invalid worker count '{}': expected a positive integer", value)
            }
            ConfigError::Io { path, message } => {
                write!(f, "Cannot read {}: {}", path.display(), message)
            }
            ConfigError::Json { path, message } => {
                write!(f, "Invalid sector mapping in {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
