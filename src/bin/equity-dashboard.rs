//! Equity dashboard command line.
//!
//! Run with: `cargo run --bin equity-dashboard -- nifty_50 --view market-summary`
//!
//! Logs go to stderr (`RUST_LOG` controls the level); the rendered view
//! payloads are printed to stdout as JSON. Year, worker count and sector file
//! come from the `DASHBOARD_*` environment variables.

use clap::{Parser, ValueEnum};
use equity_dashboard::{render, render_all, run_directory, DashboardConfig, PipelineError, View};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "equity-dashboard",
    about = "Yearly OHLC analytics over a directory of per-symbol CSV files"
)]
struct Cli {
    /// Directory of <SYMBOL>.csv files. Defaults to $DASHBOARD_DATA_DIR or ./nifty_50.
    data_dir: Option<PathBuf>,

    /// View to render, or `all`.
    #[arg(long, default_value = "all", value_parser = parse_view)]
    view: Selection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    All,
    One(View),
}

fn parse_view(value: &str) -> Result<Selection, String> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(Selection::All);
    }
    View::from_str(value, true).map(Selection::One)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let mut config = DashboardConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    config.validate()?;

    tracing::info!(
        "Loading {} data from {}",
        config.target_year,
        config.data_dir.display()
    );
    let output = match run_directory(&config) {
        Ok(output) => output,
        Err(PipelineError::NoData { warnings }) => {
            for warning in &warnings {
                tracing::warn!("{}", warning);
            }
            return Err(PipelineError::NoData { warnings }.into());
        }
        Err(e) => return Err(e.into()),
    };
    for warning in &output.warnings {
        tracing::warn!("{}", warning);
    }

    let json = match cli.view {
        Selection::All => serde_json::to_string_pretty(&render_all(&output, &config.views))?,
        Selection::One(view) => serde_json::to_string_pretty(&render(view, &output, &config.views))?,
    };
    println!("{}", json);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_data_dir_and_view() {
        let cli = Cli::try_parse_from(["equity-dashboard", "data", "--view", "market-summary"])
            .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("data")));
        assert_eq!(cli.view, Selection::One(View::MarketSummary));

        let cli = Cli::try_parse_from(["equity-dashboard"]).unwrap();
        assert_eq!(cli.data_dir, None);
        assert_eq!(cli.view, Selection::All);
    }

    #[test]
    fn rejects_run_settings_flags() {
        for flag in ["--year", "--sectors", "--workers"] {
            assert!(
                Cli::try_parse_from(["equity-dashboard", "data", flag, "1"]).is_err(),
                "{}",
                flag
            );
        }
    }

    #[test]
    fn rejects_unknown_view() {
        assert!(Cli::try_parse_from(["equity-dashboard", "--view", "nope"]).is_err());
    }
}
