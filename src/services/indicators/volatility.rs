//! Volatility indicators: True Range, ATR, Bollinger, Keltner, Donchian.

use super::Column;
use super::rolling::{rolling_max, rolling_min, rolling_std, safe_div};
use super::smoothing::{ema, lift, sma, smooth};
use crate::env_config::models::engine_config::{BollingerConfig, SmoothingMethod};

/// `max(H - L, |H - prevClose|, |L - prevClose|)`, undefined on the first bar.
pub fn true_range(highs: &[f64], lows: &[f64], closes: &[f64]) -> Column {
    (0..closes.len())
        .map(|i| {
            let prev_close = closes[i.checked_sub(1)?];
            let hl = highs[i] - lows[i];
            let hc = (highs[i] - prev_close).abs();
            let lc = (lows[i] - prev_close).abs();
            Some(hl.max(hc).max(lc))
        })
        .collect()
}

/// Average True Range, smoothed with `method` (Wilder by default).
pub fn atr(true_range: &[Option<f64>], period: usize, method: SmoothingMethod) -> Column {
    smooth(true_range, period, method)
}

/// ATR as a percentage of close.
pub fn natr(atr: &[Option<f64>], closes: &[f64]) -> Column {
    atr.iter()
        .zip(closes)
        .map(|(a, c)| Some(safe_div((*a)? * 100.0, *c, 0.0)))
        .collect()
}

pub struct BollingerColumns {
    pub upper: Column,
    pub middle: Column,
    pub lower: Column,
    /// `(upper - lower) / middle`
    pub width: Column,
    /// `(close - lower) / (upper - lower)`, 0.5 on zero-width bands
    pub percent_b: Column,
}

pub fn bollinger(closes: &[f64], config: &BollingerConfig) -> BollingerColumns {
    let values = lift(closes);
    let middle = sma(&values, config.period);
    let sigma = rolling_std(&values, config.period, config.std_dev);

    let n = closes.len();
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];
    let mut width = vec![None; n];
    let mut percent_b = vec![None; n];

    for i in 0..n {
        let (Some(m), Some(s)) = (middle[i], sigma[i]) else {
            continue;
        };
        let band = config.k * s;
        let (u, l) = (m + band, m - band);
        upper[i] = Some(u);
        lower[i] = Some(l);
        width[i] = Some(safe_div(u - l, m, 0.0));
        percent_b[i] = Some(safe_div(closes[i] - l, u - l, 0.5));
    }

    BollingerColumns {
        upper,
        middle,
        lower,
        width,
        percent_b,
    }
}

pub struct ChannelColumns {
    pub upper: Column,
    pub middle: Column,
    pub lower: Column,
}

/// Keltner channel: EMA middle line ± `multiplier` · ATR.
pub fn keltner(
    closes: &[f64],
    atr: &[Option<f64>],
    ema_period: usize,
    multiplier: f64,
) -> ChannelColumns {
    let middle = ema(&lift(closes), ema_period);
    let upper = middle
        .iter()
        .zip(atr)
        .map(|(m, a)| Some((*m)? + multiplier * (*a)?))
        .collect();
    let lower = middle
        .iter()
        .zip(atr)
        .map(|(m, a)| Some((*m)? - multiplier * (*a)?))
        .collect();
    ChannelColumns {
        upper,
        middle,
        lower,
    }
}

/// Donchian channel: highest high / lowest low over `period` bars.
pub fn donchian(highs: &[f64], lows: &[f64], period: usize) -> ChannelColumns {
    let upper = rolling_max(highs, period);
    let lower = rolling_min(lows, period);
    let middle = upper
        .iter()
        .zip(&lower)
        .map(|(u, l)| Some(((*u)? + (*l)?) / 2.0))
        .collect();
    ChannelColumns {
        upper,
        middle,
        lower,
    }
}
