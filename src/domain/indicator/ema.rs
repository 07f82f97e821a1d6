//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Defined from the first bar onward; period 1 reproduces the close series.

use crate::domain::ohlcv::Bar;

pub fn calculate_ema(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; bars.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(bars.len());
    let mut ema: Option<f64> = None;

    for bar in bars {
        let next = match ema {
            None => bar.close,
            Some(prev) => bar.close * k + prev * (1.0 - k),
        };
        ema = Some(next);
        values.push(ema);
    }

    values
}
