#![allow(dead_code)]

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
pub use stratanalyzer::domain::ohlcv::Bar;
use stratanalyzer::domain::error::AnalyzerError;
use stratanalyzer::domain::indicator::IndicatorParams;
use stratanalyzer::domain::rule::Predicate;
use stratanalyzer::domain::strategy::RuleConfig;
use stratanalyzer::ports::data_port::DataPort;
use std::collections::HashMap;
use std::path::Path;

pub const BASE_TIME: &str = "2025-07-10T09:15:00+05:30";

pub struct MockDataPort {
    pub data: HashMap<(String, String), Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, stock: &str, timeframe: &str, bars: Vec<Bar>) -> Self {
        self.data
            .insert((stock.to_string(), timeframe.to_string()), bars);
        self
    }

    pub fn with_error(mut self, stock: &str, reason: &str) -> Self {
        self.errors.insert(stock.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        stock: &str,
        timeframe: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, AnalyzerError> {
        if let Some(reason) = self.errors.get(stock) {
            return Err(AnalyzerError::Data {
                reason: reason.clone(),
            });
        }
        let bars: Vec<Bar> = self
            .data
            .get(&(stock.to_string(), timeframe.to_string()))
            .map(|bars| {
                bars.iter()
                    .filter(|b| {
                        let d = b.time.date_naive();
                        d >= from && d <= to
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if bars.is_empty() {
            return Err(AnalyzerError::NoData {
                stock: stock.to_string(),
                timeframe: timeframe.to_string(),
            });
        }
        Ok(bars)
    }

    fn list_stocks(&self) -> Result<Vec<String>, AnalyzerError> {
        let mut stocks: Vec<String> = self.data.keys().map(|(s, _)| s.clone()).collect();
        stocks.sort();
        stocks.dedup();
        Ok(stocks)
    }

    fn list_timeframes(&self, stock: &str) -> Result<Vec<String>, AnalyzerError> {
        let mut tfs: Vec<String> = self
            .data
            .keys()
            .filter(|(s, _)| s == stock)
            .map(|(_, tf)| tf.clone())
            .collect();
        tfs.sort();
        Ok(tfs)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn base_time() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(BASE_TIME).unwrap()
}

pub fn make_bar(time: DateTime<FixedOffset>, close: f64) -> Bar {
    Bar {
        time,
        open: close,
        high: close,
        low: close,
        close,
    }
}

/// Flat bars (open = high = low = close) one minute apart from `BASE_TIME`.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(base_time() + Duration::minutes(i as i64), c))
        .collect()
}

/// Oscillating series with a real high/low range, five minutes apart.
pub fn generate_bars(count: usize) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let x = i as f64;
            let close = 100.0 + (x * 0.3).sin() * 8.0 + (x * 0.05).cos() * 3.0;
            let open = close - (x * 0.7).sin();
            Bar {
                time: base_time() + Duration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 0.5 + (x * 0.11).sin().abs(),
                low: open.min(close) - 0.5 - (x * 0.13).cos().abs(),
                close,
            }
        })
        .collect()
}

pub fn small_params() -> IndicatorParams {
    IndicatorParams {
        ema_length: 5,
        rsi_length: 4,
        st_length: 3,
        st_multiplier: 2.0,
    }
}

pub fn ema_cross_config(ema_length: usize) -> RuleConfig {
    RuleConfig::new(
        IndicatorParams {
            ema_length,
            rsi_length: 2,
            st_length: 2,
            st_multiplier: 3.0,
        },
        vec![Predicate::PriceAboveEma],
        vec![Predicate::PriceBelowEma],
    )
}

/// Write bars as `NSE_<stock>_<timeframe>.csv` under `dir`.
pub fn write_stock_csv(dir: &Path, stock: &str, timeframe: &str, bars: &[Bar]) {
    let mut content = String::from("time,open,high,low,close,volume\n");
    for bar in bars {
        content.push_str(&format!(
            "{},{},{},{},{},1000\n",
            bar.time.to_rfc3339(),
            bar.open,
            bar.high,
            bar.low,
            bar.close
        ));
    }
    std::fs::write(dir.join(format!("NSE_{}_{}.csv", stock, timeframe)), content).unwrap();
}
