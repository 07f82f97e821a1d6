//! Inline SVG chart rendering for HTML reports.

use crate::domain::indicator::{EnrichedBars, TrendDirection};
use crate::domain::metrics::EquityPoint;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 240.0;
const PADDING: f64 = 40.0;

const CLOSE_COLOR: &str = "#2563eb";
const EMA_COLOR: &str = "#f59e0b";
const ST_UP_COLOR: &str = "#16a34a";
const ST_DOWN_COLOR: &str = "#dc2626";
const RSI_COLOR: &str = "#7c3aed";

/// Reference levels drawn on the RSI panel when no threshold is configured.
pub const DEFAULT_RSI_LEVELS: [f64; 2] = [30.0, 70.0];

/// Maps series index and value onto the plot area.
struct Frame {
    min: f64,
    max: f64,
    count: usize,
}

impl Frame {
    fn new(min: f64, max: f64, count: usize) -> Self {
        Self { min, max, count }
    }

    fn x(&self, i: usize) -> f64 {
        let plot_width = WIDTH - 2.0 * PADDING;
        let steps = self.count.max(2) - 1;
        PADDING + i as f64 * plot_width / steps as f64
    }

    fn y(&self, v: f64) -> f64 {
        let plot_height = HEIGHT - 2.0 * PADDING;
        let range = self.max - self.min;
        let scale = if range > 0.0 { plot_height / range } else { 1.0 };
        HEIGHT - PADDING - (v - self.min) * scale
    }

    fn polyline(&self, points: &[(usize, f64)], color: &str, width: f64) -> String {
        let coords: Vec<String> = points
            .iter()
            .map(|&(i, v)| format!("{:.1},{:.1}", self.x(i), self.y(v)))
            .collect();
        format!(
            r#"  <polyline fill="none" stroke="{}" stroke-width="{}" points="{}"/>"#,
            color,
            width,
            coords.join(" ")
        )
    }

    fn level(&self, v: f64) -> String {
        format!(
            r##"  <line x1="{p:.0}" y1="{y:.1}" x2="{right:.0}" y2="{y:.1}" stroke="#d1d5db" stroke-dasharray="4 4"/>"##,
            p = PADDING,
            right = WIDTH - PADDING,
            y = self.y(v),
        )
    }

    /// Wrap `body` with background, axes and min/max labels.
    fn render(&self, body: &[String]) -> String {
        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">
  <rect width="100%" height="100%" fill="white"/>
  <line x1="{p:.0}" y1="{p:.0}" x2="{p:.0}" y2="{bottom:.0}" stroke="#9ca3af"/>
  <line x1="{p:.0}" y1="{bottom:.0}" x2="{right:.0}" y2="{bottom:.0}" stroke="#9ca3af"/>
  <text x="4" y="{top_label:.0}" font-size="11">{max:.2}</text>
  <text x="4" y="{bottom:.0}" font-size="11">{min:.2}</text>
{body}
</svg>"##,
            w = WIDTH,
            h = HEIGHT,
            p = PADDING,
            bottom = HEIGHT - PADDING,
            right = WIDTH - PADDING,
            top_label = PADDING + 4.0,
            max = self.max,
            min = self.min,
            body = body.join("\n"),
        )
    }
}

fn extremes(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Contiguous runs of defined values, each run keyed by `key`. A new run
/// starts after a gap or when the key changes; a key change keeps the previous
/// point so the line stays connected.
fn runs<K: PartialEq + Copy>(values: &[Option<(f64, K)>]) -> Vec<(K, Vec<(usize, f64)>)> {
    let mut out: Vec<(K, Vec<(usize, f64)>)> = Vec::new();
    let mut last: Option<(usize, f64, K)> = None;
    for (i, value) in values.iter().enumerate() {
        let Some((v, key)) = (*value).filter(|p| p.0.is_finite()) else {
            last = None;
            continue;
        };
        match last {
            Some((_, _, k)) if k == key => {
                if let Some((_, points)) = out.last_mut() {
                    points.push((i, v));
                }
            }
            Some((j, prev, _)) => out.push((key, vec![(j, prev), (i, v)])),
            None => out.push((key, vec![(i, v)])),
        }
        last = Some((i, v, key));
    }
    out
}

/// Cumulative profit line with a dashed zero baseline. The curve starts at
/// zero before the first trade.
pub fn equity_svg(equity_curve: &[EquityPoint]) -> String {
    if equity_curve.is_empty() {
        return "<p>No closed trades.</p>".to_string();
    }

    let values: Vec<(usize, f64)> = std::iter::once(0.0)
        .chain(equity_curve.iter().map(|p| p.cumulative_profit))
        .enumerate()
        .collect();

    let (min, max) = extremes(values.iter().map(|p| p.1)).unwrap_or((0.0, 0.0));
    let frame = Frame::new(min, max, values.len());

    frame.render(&[frame.level(0.0), frame.polyline(&values, CLOSE_COLOR, 2.0)])
}

/// Close, EMA and the Supertrend stop over the whole series. The Supertrend
/// line is green while the trend is up and red while it is down.
pub fn price_svg(series: &EnrichedBars) -> String {
    if series.is_empty() {
        return "<p>No price data.</p>".to_string();
    }

    let close: Vec<(usize, f64)> = series
        .iter()
        .enumerate()
        .map(|(i, b)| (i, b.bar.close))
        .collect();
    let ema: Vec<Option<(f64, ())>> = series
        .iter()
        .map(|b| b.indicators.ema.map(|v| (v, ())))
        .collect();
    let supertrend: Vec<Option<(f64, TrendDirection)>> = series
        .iter()
        .map(|b| b.indicators.supertrend.map(|p| (p.value, p.direction)))
        .collect();

    let all = close
        .iter()
        .map(|p| p.1)
        .chain(ema.iter().flatten().map(|p| p.0))
        .chain(supertrend.iter().flatten().map(|p| p.0));
    let Some((min, max)) = extremes(all) else {
        return "<p>No price data.</p>".to_string();
    };
    let frame = Frame::new(min, max, series.len());

    let mut body = vec![frame.polyline(&close, CLOSE_COLOR, 1.5)];
    for (_, points) in runs(&ema) {
        body.push(frame.polyline(&points, EMA_COLOR, 1.5));
    }
    for (direction, points) in runs(&supertrend) {
        let color = match direction {
            TrendDirection::Up => ST_UP_COLOR,
            TrendDirection::Down => ST_DOWN_COLOR,
        };
        body.push(frame.polyline(&points, color, 1.5));
    }
    frame.render(&body)
}

/// RSI on a fixed 0-100 scale with dashed lines at `levels`.
pub fn rsi_svg(series: &EnrichedBars, levels: &[f64]) -> String {
    let rsi: Vec<Option<(f64, ())>> = series
        .iter()
        .map(|b| b.indicators.rsi.map(|v| (v, ())))
        .collect();
    let segments = runs(&rsi);
    if segments.is_empty() {
        return "<p>RSI not available.</p>".to_string();
    }

    let frame = Frame::new(0.0, 100.0, series.len());
    let mut body: Vec<String> = levels.iter().map(|&l| frame.level(l)).collect();
    for (_, points) in segments {
        body.push(frame.polyline(&points, RSI_COLOR, 1.5));
    }
    frame.render(&body)
}
