//! Backtest engine: the long-only, single-position trade simulator.
//!
//! States are `Flat` and `Long`. A bar is checked for entry only while flat and
//! for exit only while long, so a bar that closes a position never reopens one.
//! An open position at end of series is reported as `open_position`, not as a
//! trade.

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info};

use crate::domain::error::AnalyzerError;
use crate::domain::indicator::{self, EnrichedBar, EnrichedBars, IndicatorKind};
use crate::domain::metrics::{RunSummary, summarize};
use crate::domain::ohlcv::Bar;
use crate::domain::position::{Position, Trade, TradeLedger};
use crate::domain::rule::Side;
use crate::domain::rule_eval::evaluate_side;
use crate::domain::strategy::RuleConfig;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long(Position),
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            PositionState::Flat => None,
            PositionState::Long(p) => Some(p),
        }
    }
}

/// What happened on a single simulator step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    Opened(Position),
    Closed(Trade),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub ledger: TradeLedger,
    pub open_position: Option<Position>,
}

/// Incremental simulator; feed bars in order with [`Simulator::step`].
#[derive(Debug)]
pub struct Simulator<'a> {
    config: &'a RuleConfig,
    required: Vec<IndicatorKind>,
    state: PositionState,
    ledger: TradeLedger,
    next_index: usize,
}

impl<'a> Simulator<'a> {
    pub fn new(config: &'a RuleConfig) -> Self {
        Self {
            config,
            required: config.required_indicators(),
            state: PositionState::Flat,
            ledger: TradeLedger::new(),
            next_index: 0,
        }
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    /// Process the bar at `index`. Indices must be strictly increasing; a bar
    /// at or before one already consumed is ignored. Bars whose required
    /// indicators are still warming up advance the index without a decision.
    pub fn step(&mut self, index: usize, bar: &EnrichedBar) -> Option<StepEvent> {
        if index < self.next_index {
            return None;
        }
        self.next_index = index + 1;

        if !self.required.iter().all(|&k| bar.indicators.is_defined(k)) {
            return None;
        }

        match std::mem::take(&mut self.state) {
            PositionState::Flat => {
                if evaluate_side(bar, &self.config.entry.predicates, Side::Entry) {
                    let position = Position {
                        entry_index: index,
                        entry_time: bar.bar.time,
                        entry_price: bar.bar.close,
                    };
                    debug!(index, price = position.entry_price, "opened long");
                    self.state = PositionState::Long(position.clone());
                    return Some(StepEvent::Opened(position));
                }
                None
            }
            PositionState::Long(position) => {
                if evaluate_side(bar, &self.config.exit.predicates, Side::Exit) {
                    let trade = position.close(index, bar.bar.time, bar.bar.close);
                    debug!(index, price = trade.exit_price, profit = trade.profit, "closed long");
                    self.ledger.push(trade.clone());
                    return Some(StepEvent::Closed(trade));
                }
                self.state = PositionState::Long(position);
                None
            }
        }
    }

    pub fn finish(self) -> SimulationOutcome {
        SimulationOutcome {
            ledger: self.ledger,
            open_position: match self.state {
                PositionState::Flat => None,
                PositionState::Long(p) => Some(p),
            },
        }
    }
}

/// Walk `bars` once from the first fully warmed-up bar.
pub fn simulate(bars: &EnrichedBars, config: &RuleConfig) -> SimulationOutcome {
    let mut sim = Simulator::new(config);
    if let Some(start) = bars.first_complete(&sim.required) {
        for (i, bar) in bars.iter().enumerate().skip(start) {
            sim.step(i, bar);
        }
    }
    sim.finish()
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub ledger: TradeLedger,
    pub summary: RunSummary,
    pub open_position: Option<Position>,
    pub bars_processed: usize,
    pub first_signal_index: Option<usize>,
    /// The indicator-enriched series the run walked.
    pub series: EnrichedBars,
}

impl BacktestResult {
    /// Profit of the still-open position marked at the last close, if any.
    pub fn open_pnl(&self, last_close: f64) -> Option<f64> {
        self.open_position
            .as_ref()
            .map(|p| p.unrealized_pnl(last_close))
    }

    /// Times of the first and last bar in the series.
    pub fn data_range(&self) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let bars = self.series.bars();
        Some((bars.first()?.bar.time, bars.last()?.bar.time))
    }
}

/// Compute indicators, simulate, and summarize in one call.
pub fn run(bars: &[Bar], config: &RuleConfig) -> Result<BacktestResult, AnalyzerError> {
    config.validate()?;
    let enriched = indicator::compute_with(bars, &config.indicators)?;
    Ok(run_enriched(&enriched, config))
}

pub fn run_enriched(bars: &EnrichedBars, config: &RuleConfig) -> BacktestResult {
    let first_signal_index = bars.first_complete(&config.required_indicators());
    info!(
        bars = bars.len(),
        entry = %config.entry,
        exit = %config.exit,
        "running backtest"
    );

    let outcome = simulate(bars, config);
    let summary = summarize(&outcome.ledger);

    info!(
        trades = summary.total_trades,
        total_profit = summary.total_profit,
        win_rate = summary.win_rate,
        "backtest complete"
    );

    BacktestResult {
        ledger: outcome.ledger,
        summary,
        open_position: outcome.open_position,
        bars_processed: bars.len(),
        first_signal_index,
        series: bars.clone(),
    }
}
