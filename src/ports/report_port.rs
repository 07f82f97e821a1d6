//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::AnalyzerError;
use crate::domain::strategy::RuleConfig;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        config: &RuleConfig,
        output_path: &str,
    ) -> Result<(), AnalyzerError>;
}
