//! Supertrend — ATR-based directional indicator.
//!
//! Inherently sequential: direction flips between support and resistance
//! based on close vs band comparisons.
//!
//! Output per bar: the active band (lower band when trending up, upper band
//! when trending down) and the direction. Undefined until ATR warm-up completes.

use std::fmt;

use crate::domain::indicator::atr::calculate_atr;
use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrendDirection {
    Up = 1,
    Down = -1,
}

impl TrendDirection {
    pub fn signal(self) -> i8 {
        self as i8
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Up => write!(f, "UP"),
            TrendDirection::Down => write!(f, "DOWN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupertrendPoint {
    pub value: f64,
    pub direction: TrendDirection,
}

pub fn calculate_supertrend(
    bars: &[Bar],
    period: usize,
    multiplier: f64,
) -> Vec<Option<SupertrendPoint>> {
    let mut values = vec![None; bars.len()];
    let atr = calculate_atr(bars, period);

    let start = match atr.iter().position(Option::is_some) {
        Some(idx) => idx,
        None => return values,
    };

    let band = |bar: &Bar, atr: f64| {
        let hl2 = bar.hl2();
        (hl2 + multiplier * atr, hl2 - multiplier * atr)
    };

    let (mut upper, mut lower) = match atr[start] {
        Some(a) => band(&bars[start], a),
        None => return values,
    };
    let mut direction = TrendDirection::Up;
    values[start] = Some(SupertrendPoint {
        value: lower,
        direction,
    });

    for i in (start + 1)..bars.len() {
        let Some(a) = atr[i] else {
            continue;
        };
        let (basic_upper, basic_lower) = band(&bars[i], a);
        let prev_close = bars[i - 1].close;

        // Upper band can only decrease (tighten resistance)
        upper = if prev_close <= upper {
            basic_upper.min(upper)
        } else {
            basic_upper
        };
        // Lower band can only increase (tighten support)
        lower = if prev_close >= lower {
            basic_lower.max(lower)
        } else {
            basic_lower
        };

        let close = bars[i].close;
        direction = match direction {
            TrendDirection::Up if close < lower => TrendDirection::Down,
            TrendDirection::Down if close > upper => TrendDirection::Up,
            d => d,
        };

        let value = match direction {
            TrendDirection::Up => lower,
            TrendDirection::Down => upper,
        };
        values[i] = Some(SupertrendPoint { value, direction });
    }

    values
}
