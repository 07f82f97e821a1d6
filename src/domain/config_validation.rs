//! Configuration validation.
//!
//! Validates all config fields before any data is loaded.

use crate::domain::error::AnalyzerError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), AnalyzerError> {
    require_non_empty(config, "data", "stock")?;
    require_non_empty(config, "data", "timeframe")?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), AnalyzerError> {
    validate_periods(config)?;
    validate_multiplier(config)?;
    for section in ["entry", "exit"] {
        validate_rule_section(config, section)?;
    }
    Ok(())
}

fn require_non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), AnalyzerError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(AnalyzerError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), AnalyzerError> {
    let from = parse_date(config.get_string("data", "from_date").as_deref(), "from_date")?;
    let to = parse_date(config.get_string("data", "to_date").as_deref(), "to_date")?;

    if from > to {
        return Err(AnalyzerError::ConfigInvalid {
            section: "data".to_string(),
            key: "from_date".to_string(),
            reason: "from_date must not be after to_date".to_string(),
        });
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, AnalyzerError> {
    match value {
        None => Err(AnalyzerError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| {
            AnalyzerError::ConfigInvalid {
                section: "data".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_periods(config: &dyn ConfigPort) -> Result<(), AnalyzerError> {
    for key in ["ema_period", "rsi_period", "supertrend_period"] {
        if let Some(raw) = config.get_string("indicators", key) {
            match raw.trim().parse::<i64>() {
                Ok(v) if v >= 1 => {}
                _ => {
                    return Err(AnalyzerError::ConfigInvalid {
                        section: "indicators".to_string(),
                        key: key.to_string(),
                        reason: format!("{} must be a whole number of at least 1", key),
                    });
                }
            }
        }
    }
    Ok(())
}

fn validate_multiplier(config: &dyn ConfigPort) -> Result<(), AnalyzerError> {
    if let Some(raw) = config.get_string("indicators", "supertrend_multiplier") {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => {}
            _ => {
                return Err(AnalyzerError::ConfigInvalid {
                    section: "indicators".to_string(),
                    key: "supertrend_multiplier".to_string(),
                    reason: "supertrend_multiplier must be positive".to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_rule_section(config: &dyn ConfigPort, section: &str) -> Result<(), AnalyzerError> {
    for key in ["rsi_below", "rsi_above"] {
        if let Some(raw) = config.get_string(section, key).filter(|s| !s.trim().is_empty()) {
            match raw.trim().parse::<f64>() {
                Ok(v) if (0.0..=100.0).contains(&v) => {}
                _ => {
                    return Err(AnalyzerError::ConfigInvalid {
                        section: section.to_string(),
                        key: key.to_string(),
                        reason: "RSI threshold must be between 0 and 100".to_string(),
                    });
                }
            }
        }
    }
    for key in ["price_above_ema", "price_below_ema", "supertrend_up", "supertrend_down"] {
        if let Some(raw) = config.get_string(section, key) {
            if parse_bool(&raw).is_none() {
                return Err(AnalyzerError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("expected true/false, got '{}'", raw.trim()),
                });
            }
        }
    }
    Ok(())
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
