//! Bar source port trait.

use crate::domain::error::AnalyzerError;
use crate::domain::ohlcv::Bar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `stock` at `timeframe` whose local date lies in `[from, to]`,
    /// in strictly increasing time order.
    fn fetch_bars(
        &self,
        stock: &str,
        timeframe: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, AnalyzerError>;

    fn list_stocks(&self) -> Result<Vec<String>, AnalyzerError>;

    fn list_timeframes(&self, stock: &str) -> Result<Vec<String>, AnalyzerError>;
}
