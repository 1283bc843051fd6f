//! Momentum oscillators: RSI, Stochastic, Stochastic RSI, Williams %R,
//! CCI, ROC and raw momentum.

use super::Column;
use super::rolling::{EPSILON, rolling_max, rolling_min, safe_div};
use super::smoothing::{sma, smooth};
use crate::env_config::models::engine_config::{
    SmoothingMethod, StochasticConfig, StochasticVariant,
};

/// Relative Strength Index.
///
/// Average gain and loss are smoothed with `method` (Wilder by default).
/// `avg_loss == 0` gives 100. First defined at index `period`.
pub fn rsi(closes: &[f64], period: usize, method: SmoothingMethod) -> Column {
    let n = closes.len();
    let mut gains = vec![None; n];
    let mut losses = vec![None; n];
    for i in 1..n {
        let change = closes[i] - closes[i - 1];
        gains[i] = Some(change.max(0.0));
        losses[i] = Some((-change).max(0.0));
    }

    let avg_gain = smooth(&gains, period, method);
    let avg_loss = smooth(&losses, period, method);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(g), Some(l)) => Some(rsi_value(*g, *l)),
            _ => None,
        })
        .collect()
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss.abs() < EPSILON {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

/// Stochastic oscillator, returns `(%K, %D)`.
///
/// Slow variant: raw %K smoothed by an SMA of `smoothing` bars, %D is the
/// SMA of that smoothed %K. Fast variant exposes raw %K directly.
pub fn stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    config: &StochasticConfig,
) -> (Column, Column) {
    let raw_k = range_position(highs, lows, closes, config.k_period);
    let k_line = match config.variant {
        StochasticVariant::Slow => sma(&raw_k, config.smoothing),
        StochasticVariant::Fast => raw_k,
    };
    let d_line = sma(&k_line, config.d_period);
    (k_line, d_line)
}

/// `100 * (close - lowest) / (highest - lowest)`, 50 on a flat window.
fn range_position(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Column {
    let hh = rolling_max(highs, period);
    let ll = rolling_min(lows, period);
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let (h, l) = (hh[i]?, ll[i]?);
            Some(safe_div(close - l, h - l, 0.5) * 100.0)
        })
        .map(|v| v.map(|x| x.clamp(0.0, 100.0)))
        .collect()
}

/// Stochastic of RSI over `period` RSI values, scaled 0..100.
pub fn stoch_rsi(rsi: &[Option<f64>], period: usize) -> Column {
    let mut out = vec![None; rsi.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..rsi.len() {
        let window: Option<Vec<f64>> = rsi[i + 1 - period..=i].iter().copied().collect();
        let (Some(window), Some(current)) = (window, rsi[i]) else {
            continue;
        };
        let hi = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lo = window.iter().copied().fold(f64::INFINITY, f64::min);
        out[i] = Some(safe_div(current - lo, hi - lo, 0.5) * 100.0);
    }
    out
}

/// Williams %R in [-100, 0]; a flat window gives -50.
pub fn williams_r(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Column {
    let hh = rolling_max(highs, period);
    let ll = rolling_min(lows, period);
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let (h, l) = (hh[i]?, ll[i]?);
            Some(-100.0 * safe_div(h - close, h - l, 0.5))
        })
        .collect()
}

/// Commodity Channel Index over typical price. Zero mean deviation gives 0.
pub fn cci(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Column {
    let n = closes.len();
    let mut out = vec![None; n];
    if period == 0 {
        return out;
    }
    let typical: Vec<f64> = (0..n).map(|i| (highs[i] + lows[i] + closes[i]) / 3.0).collect();
    for i in (period - 1)..n {
        let window = &typical[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let mean_dev = window.iter().map(|v| (v - mean).abs()).sum::<f64>() / period as f64;
        out[i] = Some(safe_div(typical[i] - mean, 0.015 * mean_dev, 0.0));
    }
    out
}

/// Rate of change in percent over `period` bars.
pub fn roc(closes: &[f64], period: usize) -> Column {
    (0..closes.len())
        .map(|i| {
            let prev = closes[i.checked_sub(period)?];
            Some(safe_div(closes[i] - prev, prev, 0.0) * 100.0)
        })
        .collect()
}

/// Price difference over `period` bars.
pub fn momentum(closes: &[f64], period: usize) -> Column {
    (0..closes.len())
        .map(|i| Some(closes[i] - closes[i.checked_sub(period)?]))
        .collect()
}
