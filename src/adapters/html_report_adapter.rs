//! HTML report adapter implementing ReportPort.
//!
//! Generates HTML reports using Askama templates with an inline SVG equity
//! chart.

use std::fs;
use std::path::Path;

use crate::adapters::chart_svg::{DEFAULT_RSI_LEVELS, equity_svg, price_svg, rsi_svg};
use crate::domain::backtest::BacktestResult;
use crate::domain::error::AnalyzerError;
use crate::domain::metrics::equity_curve;
use crate::domain::position::Trade;
use crate::domain::rule::Predicate;
use crate::domain::strategy::RuleConfig;
use crate::ports::report_port::ReportPort;

use askama::Template;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

struct SummaryRow {
    label: &'static str,
    value: String,
}

struct TradeRow {
    number: usize,
    entry_time: String,
    exit_time: String,
    entry_price: f64,
    exit_price: f64,
    bars_held: usize,
    profit: f64,
    class: &'static str,
}

impl TradeRow {
    fn new(number: usize, trade: &Trade) -> Self {
        let class = if trade.profit > 0.0 {
            "win"
        } else if trade.profit < 0.0 {
            "loss"
        } else {
            "flat"
        };
        Self {
            number,
            entry_time: trade.entry_time.format(TIME_FORMAT).to_string(),
            exit_time: trade.exit_time.format(TIME_FORMAT).to_string(),
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            bars_held: trade.bars_held(),
            profit: trade.profit,
            class,
        }
    }
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    title: &'a str,
    indicators: String,
    entry_rules: String,
    exit_rules: String,
    summary: Vec<SummaryRow>,
    open_position: Option<String>,
    equity_svg: String,
    price_svg: String,
    rsi_svg: String,
    trades: Vec<TradeRow>,
}

/// RSI thresholds used by the strategy, or the conventional 30/70 levels.
fn rsi_levels(config: &RuleConfig) -> Vec<f64> {
    let mut levels: Vec<f64> = config
        .entry
        .predicates
        .iter()
        .chain(&config.exit.predicates)
        .filter_map(|p| match *p {
            Predicate::RsiBelow(t) | Predicate::RsiAbove(t) => Some(t),
            _ => None,
        })
        .collect();
    if levels.is_empty() {
        return DEFAULT_RSI_LEVELS.to_vec();
    }
    levels.sort_by(f64::total_cmp);
    levels.dedup();
    levels
}

fn summary_rows(result: &BacktestResult) -> Vec<SummaryRow> {
    let summary = &result.summary;
    let (first_bar, last_bar) = match result.data_range() {
        Some((first, last)) => (
            first.format(TIME_FORMAT).to_string(),
            last.format(TIME_FORMAT).to_string(),
        ),
        None => ("-".to_string(), "-".to_string()),
    };
    let profit_factor = if summary.profit_factor.is_infinite() {
        "∞".to_string()
    } else {
        format!("{:.2}", summary.profit_factor)
    };
    vec![
        SummaryRow {
            label: "First Bar",
            value: first_bar,
        },
        SummaryRow {
            label: "Last Bar",
            value: last_bar,
        },
        SummaryRow {
            label: "Bars Processed",
            value: result.bars_processed.to_string(),
        },
        SummaryRow {
            label: "Total Trades",
            value: summary.total_trades.to_string(),
        },
        SummaryRow {
            label: "Total Profit",
            value: format!("{:.2}", summary.total_profit),
        },
        SummaryRow {
            label: "Win Rate",
            value: format!("{:.2}%", summary.win_rate),
        },
        SummaryRow {
            label: "Winning / Losing / Breakeven",
            value: format!(
                "{} / {} / {}",
                summary.winning_trades, summary.losing_trades, summary.breakeven_trades
            ),
        },
        SummaryRow {
            label: "Average Profit",
            value: format!("{:.2}", summary.average_profit),
        },
        SummaryRow {
            label: "Largest Win",
            value: format!("{:.2}", summary.largest_win),
        },
        SummaryRow {
            label: "Largest Loss",
            value: format!("{:.2}", summary.largest_loss),
        },
        SummaryRow {
            label: "Profit Factor",
            value: profit_factor,
        },
        SummaryRow {
            label: "Max Drawdown",
            value: format!("{:.2}", summary.max_drawdown),
        },
    ]
}

#[derive(Debug)]
pub struct HtmlReportAdapter {
    title: String,
}

impl HtmlReportAdapter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new("Backtest Report")
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        config: &RuleConfig,
        output_path: &str,
    ) -> Result<(), AnalyzerError> {
        let template = ReportTemplate {
            title: &self.title,
            indicators: config.indicators.to_string(),
            entry_rules: config.entry.to_string(),
            exit_rules: config.exit.to_string(),
            summary: summary_rows(result),
            open_position: result.open_position.as_ref().map(|p| {
                format!(
                    "Long since {} at {:.2}",
                    p.entry_time.format(TIME_FORMAT),
                    p.entry_price
                )
            }),
            equity_svg: equity_svg(&equity_curve(&result.ledger)),
            price_svg: price_svg(&result.series),
            rsi_svg: rsi_svg(&result.series, &rsi_levels(config)),
            trades: result
                .ledger
                .iter()
                .enumerate()
                .map(|(i, t)| TradeRow::new(i + 1, t))
                .collect(),
        };

        let html = template.render().map_err(|e| AnalyzerError::Report {
            reason: e.to_string(),
        })?;

        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, html)?;

        Ok(())
    }
}
