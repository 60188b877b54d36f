//! View adapters: turn a [`PipelineOutput`] into renderer-neutral payloads.
//!
//! Each view is a pure function of the pipeline output and the
//! [`ViewSettings`]; nothing here reads files or recomputes the dataset.
//! Payloads serialize to JSON with a `kind` tag on every panel body, so any
//! front end can draw tables, bar charts, line charts and heatmaps from them.

use crate::analytics::derived::{most_volatile, top_performers};
use crate::analytics::monthly::{monthly_boards, MonthlyReturn};
use crate::analytics::primitives::mean;
use crate::analytics::ranking::{sort_by_key, Direction};
use crate::analytics::summary::{bottom_by_return, top_by_return, SymbolSummary};
use crate::config::ViewSettings;
use crate::pipeline::PipelineOutput;
use crate::statistic::Statistic;
use crate::symbol::Symbol;
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

/// The dashboard's views, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    MarketSummary,
    Volatility,
    TopPerformers,
    SectorAnalysis,
    CorrelationHeatmap,
    MonthlyGainersLosers,
    StockRankings,
    InvestmentInsights,
    DecisionSupport,
}

impl View {
    pub const ALL: [View; 9] = [
        View::MarketSummary,
        View::Volatility,
        View::TopPerformers,
        View::SectorAnalysis,
        View::CorrelationHeatmap,
        View::MonthlyGainersLosers,
        View::StockRankings,
        View::InvestmentInsights,
        View::DecisionSupport,
    ];

    /// Menu label.
    pub fn label(&self) -> &'static str {
        match self {
            View::MarketSummary => "Market Summary",
            View::Volatility => "Volatility",
            View::TopPerformers => "Top Performers",
            View::SectorAnalysis => "Sector-wise Analysis",
            View::CorrelationHeatmap => "Correlation Heatmap",
            View::MonthlyGainersLosers => "Monthly Gainers/Losers",
            View::StockRankings => "Stock Rankings",
            View::InvestmentInsights => "Investment Insights",
            View::DecisionSupport => "Decision Support",
        }
    }
}

/// A rendered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewPayload {
    pub view: View,
    pub title: String,
    pub panels: Vec<Panel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub title: String,
    pub body: PanelBody,
}

impl Panel {
    fn new(title: impl Into<String>, body: PanelBody) -> Self {
        Panel {
            title: title.into(),
            body,
        }
    }

    fn notice(title: impl Into<String>, message: impl Into<String>) -> Self {
        Panel::new(
            title,
            PanelBody::Notice {
                message: message.into(),
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelBody {
    Metrics {
        metrics: Vec<Metric>,
    },
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<Cell>>,
    },
    BarChart {
        x_label: String,
        y_label: String,
        bars: Vec<Bar>,
    },
    LineChart {
        y_label: String,
        lines: Vec<Line>,
    },
    Heatmap {
        labels: Vec<Symbol>,
        values: Vec<Vec<Statistic>>,
    },
    Notice {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: Statistic,
}

/// A table cell: text, or a number that may be undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(Statistic),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub label: String,
    pub points: Vec<LinePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePoint {
    pub date: NaiveDate,
    pub value: Statistic,
}

/// Renders one view.
pub fn render(view: View, output: &PipelineOutput, settings: &ViewSettings) -> ViewPayload {
    let panels = match view {
        View::MarketSummary => market_summary(output, settings),
        View::Volatility => volatility(output, settings),
        View::TopPerformers => performers(output, settings),
        View::SectorAnalysis => sector_analysis(output),
        View::CorrelationHeatmap => correlation_heatmap(output),
        View::MonthlyGainersLosers => monthly_movers(output, settings),
        View::StockRankings => stock_rankings(output, settings),
        View::InvestmentInsights => investment_insights(output, settings),
        View::DecisionSupport => decision_support(output),
    };

    ViewPayload {
        view,
        title: format!("{} ({})", view.label(), output.year),
        panels,
    }
}

/// Renders every view in menu order.
pub fn render_all(output: &PipelineOutput, settings: &ViewSettings) -> Vec<ViewPayload> {
    View::ALL
        .iter()
        .map(|&view| render(view, output, settings))
        .collect()
}

fn return_table(rows: &[&SymbolSummary]) -> PanelBody {
    PanelBody::Table {
        columns: vec!["symbol".to_string(), "return_%".to_string()],
        rows: rows
            .iter()
            .map(|s| vec![Cell::Text(s.symbol.to_string()), Cell::Number(s.return_pct)])
            .collect(),
    }
}

fn return_bars(rows: &[&SymbolSummary]) -> PanelBody {
    PanelBody::BarChart {
        x_label: "Symbol".to_string(),
        y_label: "Return (%)".to_string(),
        bars: rows
            .iter()
            .filter_map(|s| {
                s.return_pct.value().map(|value| Bar {
                    label: s.symbol.to_string(),
                    value,
                })
            })
            .collect(),
    }
}

fn market_summary(output: &PipelineOutput, settings: &ViewSettings) -> Vec<Panel> {
    let summaries = &output.summaries;
    let count_where = |keep: fn(f64) -> bool| {
        summaries
            .iter()
            .filter(|s| s.return_pct.value().is_some_and(keep))
            .count() as f64
    };
    let prices: Vec<f64> = summaries.iter().map(|s| s.average_price).collect();
    let volatilities: Vec<f64> = summaries.iter().filter_map(|s| s.volatility.value()).collect();

    let metrics = vec![
        Metric {
            label: "Green Stocks".to_string(),
            value: Statistic::Value(count_where(|r| r > 0.0)),
        },
        Metric {
            label: "Red Stocks".to_string(),
            value: Statistic::Value(count_where(|r| r <= 0.0)),
        },
        Metric {
            label: "Average Price".to_string(),
            value: mean(&prices),
        },
        Metric {
            label: "Avg Volatility".to_string(),
            value: mean(&volatilities),
        },
    ];

    let n = settings.ranking_size;
    vec![
        Panel::new("Overview", PanelBody::Metrics { metrics }),
        Panel::new(
            format!("Top {} Green Stocks", n),
            return_table(&top_by_return(summaries, n)),
        ),
        Panel::new(
            format!("Top {} Red Stocks", n),
            return_table(&bottom_by_return(summaries, n)),
        ),
    ]
}

fn volatility(output: &PipelineOutput, settings: &ViewSettings) -> Vec<Panel> {
    let top = most_volatile(&output.derived, settings.volatility_board_size);
    if top.is_empty() {
        return vec![Panel::notice(
            "Most Volatile Stocks",
            "No symbol has enough daily returns to measure volatility.",
        )];
    }

    let bars = top
        .iter()
        .filter_map(|s| {
            s.return_volatility().value().map(|value| Bar {
                label: s.symbol.to_string(),
                value,
            })
        })
        .collect();

    let lines = top
        .iter()
        .map(|s| Line {
            label: s.symbol.to_string(),
            points: s
                .rolling_return_volatility(settings.rolling_window)
                .into_iter()
                .map(|(date, value)| LinePoint { date, value })
                .collect(),
        })
        .collect();

    vec![
        Panel::new(
            format!("Top {} Most Volatile Stocks", top.len()),
            PanelBody::BarChart {
                x_label: "Stock Symbol".to_string(),
                y_label: "Volatility (Std Dev)".to_string(),
                bars,
            },
        ),
        Panel::new(
            format!("Rolling {}-Day Volatility", settings.rolling_window),
            PanelBody::LineChart {
                y_label: "Volatility (Std Dev)".to_string(),
                lines,
            },
        ),
    ]
}

fn performers(output: &PipelineOutput, settings: &ViewSettings) -> Vec<Panel> {
    let top = top_performers(&output.derived, settings.top_performers);
    if top.is_empty() {
        return vec![Panel::notice(
            "Top Performing Stocks",
            "No symbol has enough observations for a cumulative return.",
        )];
    }

    let lines = top
        .iter()
        .map(|s| Line {
            label: s.symbol.to_string(),
            points: s
                .cumulative_trajectory()
                .into_iter()
                .map(|(date, value)| LinePoint { date, value })
                .collect(),
        })
        .collect();

    vec![Panel::new(
        format!("Top {} Performing Stocks (Cumulative Return)", top.len()),
        PanelBody::LineChart {
            y_label: "Cumulative Return".to_string(),
            lines,
        },
    )]
}

fn symbol_list(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn sector_analysis(output: &PipelineOutput) -> Vec<Panel> {
    let report = &output.sectors;
    let mut panels = Vec::new();

    if report.averages.is_empty() {
        panels.push(Panel::notice(
            "Average Yearly Return by Sector",
            "None of the loaded symbols has a sector mapping.",
        ));
    } else {
        let mut averages: Vec<_> = report.averages.iter().collect();
        averages.sort_by(|a, b| {
            b.average_return
                .total_cmp(&a.average_return)
                .then_with(|| a.sector.cmp(&b.sector))
        });
        panels.push(Panel::new(
            "Average Yearly Return by Sector",
            PanelBody::BarChart {
                x_label: "Sector".to_string(),
                y_label: "Average Cumulative Return".to_string(),
                bars: averages
                    .into_iter()
                    .map(|a| Bar {
                        label: a.sector.clone(),
                        value: a.average_return,
                    })
                    .collect(),
            },
        ));
    }

    if !report.unmapped.is_empty() {
        panels.push(Panel::notice(
            "Unmapped Symbols",
            format!(
                "{} symbols have no sector mapping and were excluded: {}",
                report.unmapped.len(),
                symbol_list(&report.unmapped)
            ),
        ));
    }
    if !report.undefined.is_empty() {
        panels.push(Panel::notice(
            "Undefined Returns",
            format!(
                "Excluded for a zero first close: {}",
                symbol_list(&report.undefined)
            ),
        ));
    }
    panels
}

fn correlation_heatmap(output: &PipelineOutput) -> Vec<Panel> {
    let title = "Stock Return Correlation Heatmap (Daily % Change)";
    match &output.correlation {
        Ok(matrix) => vec![Panel::new(
            title,
            PanelBody::Heatmap {
                labels: matrix.symbols.clone(),
                values: matrix.values.clone(),
            },
        )],
        Err(e) => vec![Panel::notice(title, format!("Correlation unavailable: {}", e))],
    }
}

fn movers_bars(entries: &[MonthlyReturn]) -> PanelBody {
    PanelBody::BarChart {
        x_label: "Symbol".to_string(),
        y_label: "Monthly Return".to_string(),
        bars: entries
            .iter()
            .filter_map(|e| {
                e.value.value().map(|value| Bar {
                    label: e.symbol.to_string(),
                    value,
                })
            })
            .collect(),
    }
}

fn monthly_movers(output: &PipelineOutput, settings: &ViewSettings) -> Vec<Panel> {
    let n = settings.monthly_board_size;
    monthly_boards(&output.monthly, n)
        .iter()
        .flat_map(|board| {
            [
                Panel::new(
                    format!("Top {} Gainers - {}", n, board.month),
                    movers_bars(&board.gainers),
                ),
                Panel::new(
                    format!("Top {} Losers - {}", n, board.month),
                    movers_bars(&board.losers),
                ),
            ]
        })
        .collect()
}

fn stock_rankings(output: &PipelineOutput, settings: &ViewSettings) -> Vec<Panel> {
    let n = settings.ranking_size;
    let top = top_by_return(&output.summaries, n);
    let bottom = bottom_by_return(&output.summaries, n);
    vec![
        Panel::new(format!("Top {} Green Stocks", n), return_table(&top)),
        Panel::new(format!("Top {} Red Stocks", n), return_table(&bottom)),
        Panel::new(format!("Top {} Green Stocks", n), return_bars(&top)),
        Panel::new(format!("Top {} Red Stocks", n), return_bars(&bottom)),
    ]
}

fn investment_insights(output: &PipelineOutput, settings: &ViewSettings) -> Vec<Panel> {
    let summaries = &output.summaries;
    let gain = settings.gain_threshold_pct;
    let loss = settings.loss_threshold_pct;

    let gainers: Vec<&SymbolSummary> =
        sort_by_key(summaries, |s| s.return_pct, |s| &s.symbol, Direction::Descending)
            .into_iter()
            .filter(|s| s.return_pct.value().is_some_and(|r| r > gain))
            .collect();
    let decliners: Vec<&SymbolSummary> =
        sort_by_key(summaries, |s| s.return_pct, |s| &s.symbol, Direction::Ascending)
            .into_iter()
            .filter(|s| s.return_pct.value().is_some_and(|r| r < loss))
            .collect();

    let gain_title = format!("Consistent Gainers (Return > {}%)", gain);
    let loss_title = format!("Significant Decliners (Return < {}%)", loss);
    vec![
        if gainers.is_empty() {
            Panel::notice(gain_title, "No consistent gainers found.")
        } else {
            Panel::new(gain_title, return_table(&gainers))
        },
        if decliners.is_empty() {
            Panel::notice(loss_title, "No significant decliners found.")
        } else {
            Panel::new(loss_title, return_table(&decliners))
        },
    ]
}

fn decision_support(output: &PipelineOutput) -> Vec<Panel> {
    let ranked = sort_by_key(
        &output.summaries,
        |s| s.return_pct,
        |s| &s.symbol,
        Direction::Descending,
    );
    let rows = ranked
        .into_iter()
        .map(|s| {
            vec![
                Cell::Text(s.symbol.to_string()),
                Cell::Number(Statistic::Value(s.average_price)),
                Cell::Number(s.volatility),
                Cell::Number(s.return_pct),
            ]
        })
        .collect();

    vec![Panel::new(
        "Stock Behavior Summary",
        PanelBody::Table {
            columns: ["symbol", "average_price", "volatility", "return_%"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rows,
        },
    )]
}
