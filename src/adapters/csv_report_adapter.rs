//! CSV export of the trade ledger.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::AnalyzerError;
use crate::domain::position::Trade;
use crate::domain::strategy::RuleConfig;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Serialize)]
struct TradeRecord {
    entry_time: String,
    exit_time: String,
    entry_price: f64,
    exit_price: f64,
    profit: f64,
}

impl From<&Trade> for TradeRecord {
    fn from(trade: &Trade) -> Self {
        Self {
            entry_time: trade.entry_time.to_rfc3339(),
            exit_time: trade.exit_time.to_rfc3339(),
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            profit: trade.profit,
        }
    }
}

fn csv_error(e: csv::Error) -> AnalyzerError {
    AnalyzerError::Report {
        reason: format!("CSV write error: {}", e),
    }
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        _config: &RuleConfig,
        output_path: &str,
    ) -> Result<(), AnalyzerError> {
        let path = Path::new(output_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
        if result.ledger.is_empty() {
            // serialize writes the header with the first row only
            writer
                .write_record(["entry_time", "exit_time", "entry_price", "exit_price", "profit"])
                .map_err(csv_error)?;
        }
        for trade in result.ledger.iter() {
            writer.serialize(TradeRecord::from(trade)).map_err(csv_error)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::run;
    use crate::domain::indicator::{IndicatorParams, make_bars};
    use crate::domain::rule::Predicate;
    use tempfile::tempdir;

    fn ema_config() -> RuleConfig {
        RuleConfig::new(
            IndicatorParams {
                ema_length: 2,
                rsi_length: 2,
                st_length: 2,
                st_multiplier: 3.0,
            },
            vec![Predicate::PriceAboveEma],
            vec![Predicate::PriceBelowEma],
        )
    }

    fn export(closes: &[f64]) -> String {
        let config = ema_config();
        let result = run(&make_bars(closes), &config).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        CsvReportAdapter::new()
            .write(&result, &config, path.to_str().unwrap())
            .unwrap();
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn writes_header_and_rows() {
        let contents = export(&[10.0, 12.0, 9.0, 15.0, 8.0]);
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "entry_time,exit_time,entry_price,exit_price,profit");
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "2025-07-10T09:16:00+05:30,2025-07-10T09:17:00+05:30,12.0,9.0,-3.0"
        );
    }

    #[test]
    fn empty_ledger_writes_header_only() {
        let contents = export(&[10.0, 9.0, 8.0]);
        assert_eq!(
            contents.trim_end(),
            "entry_time,exit_time,entry_price,exit_price,profit"
        );
    }

    #[test]
    fn rows_parse_back() {
        let contents = export(&[10.0, 12.0, 9.0, 15.0, 8.0]);
        let mut rdr = csv::Reader::from_reader(contents.as_bytes());
        let profits: Vec<f64> = rdr
            .records()
            .map(|r| r.unwrap()[4].parse().unwrap())
            .collect();
        assert_eq!(profits, vec![-3.0, -7.0]);
    }
}
