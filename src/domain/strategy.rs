//! Strategy configuration: indicator parameters plus entry and exit rules.

use crate::domain::error::AnalyzerError;
use crate::domain::indicator::IndicatorKind;
pub use crate::domain::indicator::IndicatorParams;
use crate::domain::rule::{Predicate, RuleSet, Side};

#[derive(Debug, Clone, PartialEq)]
pub struct RuleConfig {
    pub indicators: IndicatorParams,
    pub entry: RuleSet,
    pub exit: RuleSet,
}

impl RuleConfig {
    pub fn new(indicators: IndicatorParams, entry: Vec<Predicate>, exit: Vec<Predicate>) -> Self {
        Self {
            indicators,
            entry: RuleSet::entry(entry),
            exit: RuleSet::exit(exit),
        }
    }

    /// Indicators referenced by either side, in a stable order.
    pub fn required_indicators(&self) -> Vec<IndicatorKind> {
        let mut kinds = self.entry.indicators();
        kinds.extend(self.exit.indicators());
        kinds.into_iter().collect()
    }

    /// Check indicator parameters, RSI thresholds and that each rule set sits
    /// on the side it is used for.
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        self.indicators.validate()?;
        if self.entry.side != Side::Entry {
            return Err(AnalyzerError::invalid_parameter("entry", "rule set is not an entry rule set"));
        }
        if self.exit.side != Side::Exit {
            return Err(AnalyzerError::invalid_parameter("exit", "rule set is not an exit rule set"));
        }
        for predicate in self.entry.predicates.iter().chain(&self.exit.predicates) {
            if let Predicate::RsiBelow(t) | Predicate::RsiAbove(t) = predicate {
                if !(0.0..=100.0).contains(t) {
                    return Err(AnalyzerError::invalid_parameter(
                        "rsi_threshold",
                        format!("{} is outside 0..=100", t),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for RuleConfig {
    /// close > EMA and RSI < 30 to enter; close < EMA or RSI > 60 to exit.
    fn default() -> Self {
        RuleConfig::new(
            IndicatorParams::default(),
            vec![Predicate::PriceAboveEma, Predicate::RsiBelow(30.0)],
            vec![Predicate::PriceBelowEma, Predicate::RsiAbove(60.0)],
        )
    }
}
