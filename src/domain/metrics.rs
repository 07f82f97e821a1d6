//! Performance metrics and statistics over a trade ledger.

use chrono::{DateTime, FixedOffset};

use crate::domain::position::Trade;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunSummary {
    pub total_profit: f64,
    /// Percentage of trades with strictly positive profit, 0 with no trades.
    pub win_rate: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub average_profit: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub profit_factor: f64,
    pub max_drawdown: f64,
}

/// Cumulative profit after each trade exit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub time: DateTime<FixedOffset>,
    pub cumulative_profit: f64,
}

pub fn summarize(trades: &[Trade]) -> RunSummary {
    if trades.is_empty() {
        return RunSummary::default();
    }

    let mut total_profit = 0.0_f64;
    let mut winning_trades = 0usize;
    let mut losing_trades = 0usize;
    let mut breakeven_trades = 0usize;
    let mut total_wins = 0.0_f64;
    let mut total_losses = 0.0_f64;
    let mut largest_win = 0.0_f64;
    let mut largest_loss = 0.0_f64;

    for trade in trades {
        let pnl = trade.profit;
        total_profit += pnl;
        if pnl > 0.0 {
            winning_trades += 1;
            total_wins += pnl;
            largest_win = largest_win.max(pnl);
        } else if pnl < 0.0 {
            losing_trades += 1;
            total_losses += pnl.abs();
            largest_loss = largest_loss.max(pnl.abs());
        } else {
            breakeven_trades += 1;
        }
    }

    let total_trades = trades.len();
    let profit_factor = if total_losses > 0.0 {
        total_wins / total_losses
    } else if total_wins > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    RunSummary {
        total_profit,
        win_rate: 100.0 * winning_trades as f64 / total_trades as f64,
        total_trades,
        winning_trades,
        losing_trades,
        breakeven_trades,
        average_profit: total_profit / total_trades as f64,
        largest_win,
        largest_loss,
        profit_factor,
        max_drawdown: compute_drawdown(trades),
    }
}

pub fn equity_curve(trades: &[Trade]) -> Vec<EquityPoint> {
    let mut cumulative = 0.0;
    trades
        .iter()
        .map(|t| {
            cumulative += t.profit;
            EquityPoint {
                time: t.exit_time,
                cumulative_profit: cumulative,
            }
        })
        .collect()
}

/// Largest peak-to-trough fall of cumulative profit, starting from zero.
fn compute_drawdown(trades: &[Trade]) -> f64 {
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for point in equity_curve(trades) {
        peak = peak.max(point.cumulative_profit);
        max_dd = max_dd.max(peak - point.cumulative_profit);
    }
    max_dd
}
