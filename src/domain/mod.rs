//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod rule;
pub mod rule_eval;
pub mod strategy;
pub mod position;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
