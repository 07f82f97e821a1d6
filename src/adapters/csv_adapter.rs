//! CSV file data adapter.
//!
//! Reads `NSE_<STOCK>_<TIMEFRAME>.csv` files from a data directory. Columns are
//! located by header name, so column order and extra columns do not matter.

use crate::domain::error::AnalyzerError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use csv::StringRecord;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::{debug, warn};

const FILE_PREFIX: &str = "NSE";
const TIME_COLUMNS: [&str; 4] = ["time", "datetime", "date", "timestamp"];

#[derive(Debug)]
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, stock: &str, timeframe: &str) -> PathBuf {
        self.base_path
            .join(format!("{}_{}_{}.csv", FILE_PREFIX, stock, timeframe))
    }

    /// `(stock, timeframe)` pairs for every data file in the directory.
    fn scan(&self) -> Result<Vec<(String, String)>, AnalyzerError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| AnalyzerError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(pair) = split_file_name(&name.to_string_lossy()) {
                found.push(pair);
            }
        }
        Ok(found)
    }
}

fn split_file_name(name: &str) -> Option<(String, String)> {
    let stem = name.strip_suffix(".csv")?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 3 || parts[0] != FILE_PREFIX {
        return None;
    }
    Some((parts[1].to_string(), parts[2].to_string()))
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        stock: &str,
        timeframe: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, AnalyzerError> {
        let no_data = || AnalyzerError::NoData {
            stock: stock.to_string(),
            timeframe: timeframe.to_string(),
        };

        let path = self.csv_path(stock, timeframe);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(no_data()),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "reading bars");

        let bars = read_bars(file, from, to)?;
        if bars.is_empty() {
            return Err(no_data());
        }
        Ok(bars)
    }

    fn list_stocks(&self) -> Result<Vec<String>, AnalyzerError> {
        let stocks: BTreeSet<String> = self.scan()?.into_iter().map(|(s, _)| s).collect();
        Ok(stocks.into_iter().collect())
    }

    fn list_timeframes(&self, stock: &str) -> Result<Vec<String>, AnalyzerError> {
        let mut timeframes: Vec<String> = self
            .scan()?
            .into_iter()
            .filter(|(s, _)| s == stock)
            .map(|(_, tf)| tf)
            .collect();
        // numeric timeframes sort by value, anything else after them
        timeframes.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        });
        timeframes.dedup();
        Ok(timeframes)
    }
}

struct Columns {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, AnalyzerError> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |column: &str| names.iter().position(|n| n == column);
        let require = |column: &str| {
            find(column).ok_or_else(|| AnalyzerError::MissingColumn {
                column: column.to_string(),
            })
        };

        let time = TIME_COLUMNS
            .iter()
            .find_map(|&c| find(c))
            .ok_or_else(|| AnalyzerError::MissingColumn {
                column: "time".to_string(),
            })?;

        Ok(Self {
            time,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
        })
    }
}

/// Parse bars from CSV text, keeping those whose local date lies in
/// `[from, to]`. The result is sorted by time with duplicate timestamps removed.
pub fn read_bars<R: Read>(
    reader: R,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Bar>, AnalyzerError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers().map_err(|e| AnalyzerError::Data {
        reason: format!("CSV header error: {}", e),
    })?;
    let columns = Columns::locate(headers)?;

    let mut bars = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| AnalyzerError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;
        // header is line 1
        let line = row + 2;

        let raw_time = field(&record, columns.time, "time", line)?;
        let time = parse_timestamp(raw_time).ok_or_else(|| AnalyzerError::Data {
            reason: format!("line {}: invalid timestamp '{}'", line, raw_time),
        })?;

        let date = time.date_naive();
        if date < from || date > to {
            continue;
        }

        bars.push(Bar {
            time,
            open: price(&record, columns.open, "open", line)?,
            high: price(&record, columns.high, "high", line)?,
            low: price(&record, columns.low, "low", line)?,
            close: price(&record, columns.close, "close", line)?,
        });
    }

    // stable sort, so the first row of a duplicate group stays in front
    bars.sort_by_key(|b| b.time);
    let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last() {
            Some(prev) if prev.time == bar.time => {
                warn!(time = %bar.time, "duplicate timestamp, keeping first row");
            }
            _ => deduped.push(bar),
        }
    }
    Ok(deduped)
}

fn field<'r>(
    record: &'r StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<&'r str, AnalyzerError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| AnalyzerError::Data {
            reason: format!("line {}: missing {} value", line, name),
        })
}

fn price(record: &StringRecord, index: usize, name: &str, line: usize) -> Result<f64, AnalyzerError> {
    let raw = field(record, index, name, line)?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AnalyzerError::Data {
            reason: format!("line {}: invalid {} value '{}'", line, name, raw),
        })
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS+HH:MM`, naive datetimes and dates
/// (taken as UTC), compact `YYYYMMDD` / `YYYYMMDDHHMMSS`, or integer Unix
/// seconds. An 8- or 14-digit value is always read as a compact date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(t) = DateTime::parse_from_str(s, fmt) {
            return Some(t);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset());
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        match s.len() {
            8 => {
                return NaiveDate::parse_from_str(s, "%Y%m%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset());
            }
            14 => {
                return NaiveDateTime::parse_from_str(s, "%Y%m%d%H%M%S")
                    .ok()
                    .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset());
            }
            _ => {}
        }
    }
    s.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|t| t.fixed_offset())
}
