//! Position tracking and the trade ledger.

use chrono::{DateTime, Duration, FixedOffset};
use std::ops::Deref;

/// An open long position; lives between an entry signal and its exit.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub entry_index: usize,
    pub entry_time: DateTime<FixedOffset>,
    pub entry_price: f64,
}

impl Position {
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        price - self.entry_price
    }

    pub(crate) fn close(
        self,
        exit_index: usize,
        exit_time: DateTime<FixedOffset>,
        exit_price: f64,
    ) -> Trade {
        Trade {
            entry_index: self.entry_index,
            exit_index,
            entry_time: self.entry_time,
            exit_time,
            entry_price: self.entry_price,
            exit_price,
            profit: exit_price - self.entry_price,
        }
    }
}

/// A closed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_index: usize,
    pub exit_index: usize,
    pub entry_time: DateTime<FixedOffset>,
    pub exit_time: DateTime<FixedOffset>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub profit: f64,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.profit > 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }

    pub fn duration(&self) -> Duration {
        self.exit_time - self.entry_time
    }
}

/// Completed trades in chronological order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn as_slice(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_vec(self) -> Vec<Trade> {
        self.trades
    }
}

impl Deref for TradeLedger {
    type Target = [Trade];

    fn deref(&self) -> &[Trade] {
        &self.trades
    }
}

impl From<Vec<Trade>> for TradeLedger {
    fn from(trades: Vec<Trade>) -> Self {
        Self { trades }
    }
}
