//! Trading rule data structures.
//!
//! - `Predicate`: one boolean condition over a bar and its indicator values
//! - `Side`: entry or exit, which fixes how predicates combine
//! - `RuleSet`: the enabled predicates for one side

use std::collections::BTreeSet;
use std::fmt;

use crate::domain::indicator::IndicatorKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    PriceAboveEma,
    PriceBelowEma,
    RsiBelow(f64),
    RsiAbove(f64),
    SupertrendUp,
    SupertrendDown,
}

impl Predicate {
    pub fn indicator(&self) -> IndicatorKind {
        match self {
            Predicate::PriceAboveEma | Predicate::PriceBelowEma => IndicatorKind::Ema,
            Predicate::RsiBelow(_) | Predicate::RsiAbove(_) => IndicatorKind::Rsi,
            Predicate::SupertrendUp | Predicate::SupertrendDown => IndicatorKind::Supertrend,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::PriceAboveEma => write!(f, "close > EMA"),
            Predicate::PriceBelowEma => write!(f, "close < EMA"),
            Predicate::RsiBelow(t) => write!(f, "RSI < {}", t),
            Predicate::RsiAbove(t) => write!(f, "RSI > {}", t),
            Predicate::SupertrendUp => write!(f, "SUPERTREND = UP"),
            Predicate::SupertrendDown => write!(f, "SUPERTREND = DOWN"),
        }
    }
}

/// Entry requires every enabled predicate; exit fires on the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Entry,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    All,
    Any,
}

impl Side {
    pub fn combinator(self) -> Combinator {
        match self {
            Side::Entry => Combinator::All,
            Side::Exit => Combinator::Any,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Entry => write!(f, "entry"),
            Side::Exit => write!(f, "exit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub side: Side,
    pub predicates: Vec<Predicate>,
}

impl RuleSet {
    pub fn new(side: Side, predicates: Vec<Predicate>) -> Self {
        Self { side, predicates }
    }

    pub fn entry(predicates: Vec<Predicate>) -> Self {
        Self::new(Side::Entry, predicates)
    }

    pub fn exit(predicates: Vec<Predicate>) -> Self {
        Self::new(Side::Exit, predicates)
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn indicators(&self) -> BTreeSet<IndicatorKind> {
        self.predicates.iter().map(Predicate::indicator).collect()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.predicates.is_empty() {
            return write!(f, "(none)");
        }
        let joiner = match self.side.combinator() {
            Combinator::All => " AND ",
            Combinator::Any => " OR ",
        };
        let parts: Vec<String> = self.predicates.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(joiner))
    }
}
