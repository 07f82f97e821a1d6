//! Rule evaluation engine.
//!
//! Evaluates a rule set against one enriched bar.
//!
//! # Evaluation Semantics
//!
//! - Entry: every enabled predicate must hold; short-circuits on first `false`
//! - Exit: any enabled predicate triggers; short-circuits on first `true`
//! - A side with no enabled predicates evaluates to `false`
//! - A predicate whose indicator is undefined or NaN evaluates to `false`

use crate::domain::indicator::{EnrichedBar, TrendDirection};
use crate::domain::rule::{Combinator, Predicate, RuleSet, Side};

pub fn evaluate(bar: &EnrichedBar, rules: &RuleSet) -> bool {
    evaluate_side(bar, &rules.predicates, rules.side)
}

/// Combine `predicates` the way `side` requires.
pub fn evaluate_side(bar: &EnrichedBar, predicates: &[Predicate], side: Side) -> bool {
    if predicates.is_empty() {
        return false;
    }
    match side.combinator() {
        Combinator::All => predicates.iter().all(|p| evaluate_predicate(bar, p)),
        Combinator::Any => predicates.iter().any(|p| evaluate_predicate(bar, p)),
    }
}

pub fn evaluate_predicate(bar: &EnrichedBar, predicate: &Predicate) -> bool {
    let close = bar.bar.close;
    let ind = &bar.indicators;
    match *predicate {
        Predicate::PriceAboveEma => defined(ind.ema).is_some_and(|ema| close > ema),
        Predicate::PriceBelowEma => defined(ind.ema).is_some_and(|ema| close < ema),
        Predicate::RsiBelow(threshold) => defined(ind.rsi).is_some_and(|rsi| rsi < threshold),
        Predicate::RsiAbove(threshold) => defined(ind.rsi).is_some_and(|rsi| rsi > threshold),
        Predicate::SupertrendUp => direction(bar) == Some(TrendDirection::Up),
        Predicate::SupertrendDown => direction(bar) == Some(TrendDirection::Down),
    }
}

fn defined(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

fn direction(bar: &EnrichedBar) -> Option<TrendDirection> {
    bar.indicators
        .supertrend
        .filter(|p| !p.value.is_nan())
        .map(|p| p.direction)
}
