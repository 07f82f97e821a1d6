//! Technical indicator implementations.
//!
//! This module provides the strongly-typed indicator columns attached to each bar:
//! - `IndicatorParams`: period lengths and the Supertrend multiplier
//! - `IndicatorSet`: per-bar EMA, RSI and Supertrend values (`None` during warm-up)
//! - `EnrichedBars`: the input series paired with its indicator columns
//! - `compute`: builds an `EnrichedBars` from raw bars

pub mod atr;
pub mod ema;
pub mod rsi;
pub mod supertrend;

use std::fmt;

use crate::domain::error::AnalyzerError;
use crate::domain::ohlcv::Bar;

pub use supertrend::{SupertrendPoint, TrendDirection};

/// Identity of an indicator column, used to express warm-up requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorKind {
    Ema,
    Rsi,
    Supertrend,
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Ema => write!(f, "EMA"),
            IndicatorKind::Rsi => write!(f, "RSI"),
            IndicatorKind::Supertrend => write!(f, "SUPERTREND"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    pub ema_length: usize,
    pub rsi_length: usize,
    pub st_length: usize,
    pub st_multiplier: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            ema_length: 20,
            rsi_length: 14,
            st_length: 7,
            st_multiplier: 3.0,
        }
    }
}

impl IndicatorParams {
    /// Longest warm-up window among the configured indicators.
    pub fn max_window(&self) -> usize {
        self.ema_length.max(self.rsi_length).max(self.st_length)
    }

    pub fn validate(&self) -> Result<(), AnalyzerError> {
        for (name, value) in [
            ("ema_length", self.ema_length),
            ("rsi_length", self.rsi_length),
            ("st_length", self.st_length),
        ] {
            if value == 0 {
                return Err(AnalyzerError::invalid_parameter(name, "period must be at least 1"));
            }
        }
        if !self.st_multiplier.is_finite() || self.st_multiplier <= 0.0 {
            return Err(AnalyzerError::invalid_parameter(
                "st_multiplier",
                "multiplier must be a positive finite number",
            ));
        }
        Ok(())
    }
}

impl fmt::Display for IndicatorParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EMA({}), RSI({}), SUPERTREND({},{})",
            self.ema_length, self.rsi_length, self.st_length, self.st_multiplier
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorSet {
    pub ema: Option<f64>,
    pub rsi: Option<f64>,
    pub supertrend: Option<SupertrendPoint>,
}

impl IndicatorSet {
    pub fn supertrend_value(&self) -> Option<f64> {
        self.supertrend.map(|p| p.value)
    }

    pub fn supertrend_direction(&self) -> Option<TrendDirection> {
        self.supertrend.map(|p| p.direction)
    }

    /// Whether the column for `kind` has a defined value on this bar.
    pub fn is_defined(&self, kind: IndicatorKind) -> bool {
        match kind {
            IndicatorKind::Ema => self.ema.is_some_and(f64::is_finite),
            IndicatorKind::Rsi => self.rsi.is_some_and(f64::is_finite),
            IndicatorKind::Supertrend => self.supertrend.is_some_and(|p| p.value.is_finite()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBar {
    pub bar: Bar,
    pub indicators: IndicatorSet,
}

/// A bar series with its indicator columns, computed once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBars {
    params: IndicatorParams,
    bars: Vec<EnrichedBar>,
}

impl EnrichedBars {
    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    pub fn bars(&self) -> &[EnrichedBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&EnrichedBar> {
        self.bars.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnrichedBar> {
        self.bars.iter()
    }

    /// Index of the first bar where every indicator in `required` is defined.
    ///
    /// Returns `Some(0)` when nothing is required and `None` when the warm-up
    /// never completes within the series.
    pub fn first_complete(&self, required: &[IndicatorKind]) -> Option<usize> {
        self.bars
            .iter()
            .position(|b| required.iter().all(|&k| b.indicators.is_defined(k)))
    }
}

impl<'a> IntoIterator for &'a EnrichedBars {
    type Item = &'a EnrichedBar;
    type IntoIter = std::slice::Iter<'a, EnrichedBar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}

/// Compute EMA, RSI and Supertrend columns for `bars`.
///
/// Fails with `InsufficientData` when the series is shorter than the longest
/// requested window. The input slice is only read.
pub fn compute(
    bars: &[Bar],
    ema_length: usize,
    rsi_length: usize,
    st_length: usize,
    st_multiplier: f64,
) -> Result<EnrichedBars, AnalyzerError> {
    compute_with(
        bars,
        &IndicatorParams {
            ema_length,
            rsi_length,
            st_length,
            st_multiplier,
        },
    )
}

pub fn compute_with(bars: &[Bar], params: &IndicatorParams) -> Result<EnrichedBars, AnalyzerError> {
    params.validate()?;

    let minimum = params.max_window();
    if bars.len() < minimum {
        return Err(AnalyzerError::InsufficientData {
            bars: bars.len(),
            minimum,
        });
    }

    if let Some(index) = bars
        .windows(2)
        .position(|w| w[1].time <= w[0].time)
        .map(|i| i + 1)
    {
        return Err(AnalyzerError::UnorderedSeries { index });
    }

    let ema = ema::calculate_ema(bars, params.ema_length);
    let rsi = rsi::calculate_rsi(bars, params.rsi_length);
    let st = supertrend::calculate_supertrend(bars, params.st_length, params.st_multiplier);

    let enriched = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| EnrichedBar {
            bar: bar.clone(),
            indicators: IndicatorSet {
                ema: ema[i],
                rsi: rsi[i],
                supertrend: st[i],
            },
        })
        .collect();

    Ok(EnrichedBars {
        params: *params,
        bars: enriched,
    })
}

/// Create bars with `open = high = low = close` at one-minute spacing.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{DateTime, Duration};
    let base = DateTime::parse_from_rfc3339("2025-07-10T09:15:00+05:30").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            time: base + Duration::minutes(i as i64),
            open: close,
            high: close,
            low: close,
            close,
        })
        .collect()
}

/// Create bars with an explicit high/low range around each close.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    use chrono::{DateTime, Duration};
    let base = DateTime::parse_from_rfc3339("2025-07-10T09:15:00+05:30").unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            time: base + Duration::minutes(i as i64),
            open,
            high,
            low,
            close,
        })
        .collect()
}
