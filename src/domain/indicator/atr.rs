//! Average True Range, the volatility input to Supertrend.
//!
//! True range needs a previous close, so the first bar has none. The seed is
//! the simple mean of the first n true ranges (bars 1..=n); Wilder smoothing
//! follows. Warmup: first n bars are undefined.

use crate::domain::ohlcv::Bar;

pub fn calculate_atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; bars.len()];
    if period == 0 || bars.len() <= period {
        return values;
    }

    let tr: Vec<f64> = bars
        .windows(2)
        .map(|w| w[1].true_range(w[0].close))
        .collect();

    let mut atr = tr[..period].iter().sum::<f64>() / period as f64;
    values[period] = Some(atr);

    for i in (period + 1)..bars.len() {
        atr = (atr * (period - 1) as f64 + tr[i - 1]) / period as f64;
        values[i] = Some(atr);
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::make_ohlc_bars;
    use approx::assert_relative_eq;

    #[test]
    fn atr_warmup() {
        let bars = make_ohlc_bars(&[(100.0, 110.0, 90.0, 100.0); 5]);
        let values = calculate_atr(&bars, 3);
        assert_eq!(values.len(), 5);
        assert!(values[..3].iter().all(Option::is_none));
        assert!(values[3..].iter().all(Option::is_some));
    }

    #[test]
    fn atr_seed_is_average() {
        let bars = make_ohlc_bars(&[
            (105.0, 110.0, 100.0, 105.0),
            (110.0, 115.0, 105.0, 110.0),
            (115.0, 120.0, 110.0, 115.0),
            (120.0, 130.0, 115.0, 120.0),
        ]);
        // TR: max(10, 10, 0) = 10, max(10, 10, 0) = 10, max(15, 15, 0) = 15
        let values = calculate_atr(&bars, 3);
        assert_relative_eq!(values[3].unwrap(), 35.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn atr_wilder_smoothing() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 100.0),
            (100.0, 105.0, 95.0, 100.0),
            (100.0, 105.0, 95.0, 100.0),
            (100.0, 120.0, 100.0, 110.0),
        ]);
        let values = calculate_atr(&bars, 2);
        // seed = (10 + 10) / 2; next TR = max(20, 20, 0) = 20
        assert_relative_eq!(values[2].unwrap(), 10.0);
        assert_relative_eq!(values[3].unwrap(), (10.0 + 20.0) / 2.0);
    }

    #[test]
    fn atr_too_few_bars() {
        let bars = make_ohlc_bars(&[(100.0, 110.0, 90.0, 100.0); 3]);
        assert!(calculate_atr(&bars, 3).iter().all(Option::is_none));
    }
}
