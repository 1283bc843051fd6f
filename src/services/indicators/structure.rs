//! Price structure: returns, range position, candle anatomy, floor pivots.

use super::Column;
use super::rolling::{rolling_max, rolling_min, rolling_std, safe_div};
use crate::env_config::models::engine_config::StdDevConvention;

/// Simple return over `period` bars; a zero base close gives 0.
pub fn simple_return(closes: &[f64], period: usize) -> Column {
    (0..closes.len())
        .map(|i| {
            let base = closes[i.checked_sub(period)?];
            Some(safe_div(closes[i] - base, base, 0.0))
        })
        .collect()
}

/// `ln(close / prev_close)`, null when either close is not positive.
pub fn log_return(closes: &[f64]) -> Column {
    (0..closes.len())
        .map(|i| {
            let prev = closes[i.checked_sub(1)?];
            (prev > 0.0 && closes[i] > 0.0).then(|| (closes[i] / prev).ln())
        })
        .collect()
}

/// Sample standard deviation of 1-bar returns over `period` bars.
pub fn volatility(returns: &[Option<f64>], period: usize) -> Column {
    rolling_std(returns, period, StdDevConvention::Sample)
}

pub struct RangeColumns {
    pub high: Column,
    pub low: Column,
    /// Percent distance of close below the rolling high (<= 0).
    pub pct_from_high: Column,
}

pub fn range_position(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> RangeColumns {
    let high = rolling_max(highs, period);
    let low = rolling_min(lows, period);
    let pct_from_high = high
        .iter()
        .zip(closes)
        .map(|(h, c)| {
            let h = (*h)?;
            Some(100.0 * safe_div(c - h, h, 0.0))
        })
        .collect();
    RangeColumns {
        high,
        low,
        pct_from_high,
    }
}

/// Percent distance of close from a reference line.
pub fn distance_pct(closes: &[f64], reference: &[Option<f64>]) -> Column {
    closes
        .iter()
        .zip(reference)
        .map(|(c, r)| {
            let r = (*r)?;
            Some(100.0 * safe_div(c - r, r, 0.0))
        })
        .collect()
}

pub struct CandleColumns {
    /// `|close - open| / (high - low)`
    pub body_pct: Column,
    pub upper_wick_pct: Column,
    pub lower_wick_pct: Column,
    /// Percent gap between this open and the previous close.
    pub gap_pct: Column,
}

/// Candle anatomy as fractions of the bar range; a zero-range bar gives 0.
pub fn candle(opens: &[f64], highs: &[f64], lows: &[f64], closes: &[f64]) -> CandleColumns {
    let n = closes.len();
    let mut body_pct = Vec::with_capacity(n);
    let mut upper_wick_pct = Vec::with_capacity(n);
    let mut lower_wick_pct = Vec::with_capacity(n);
    let mut gap_pct = Vec::with_capacity(n);

    for i in 0..n {
        let range = highs[i] - lows[i];
        let top = opens[i].max(closes[i]);
        let bottom = opens[i].min(closes[i]);
        body_pct.push(Some(safe_div(top - bottom, range, 0.0)));
        upper_wick_pct.push(Some(safe_div(highs[i] - top, range, 0.0)));
        lower_wick_pct.push(Some(safe_div(bottom - lows[i], range, 0.0)));
        gap_pct.push(
            i.checked_sub(1)
                .map(|p| 100.0 * safe_div(opens[i] - closes[p], closes[p], 0.0)),
        );
    }

    CandleColumns {
        body_pct,
        upper_wick_pct,
        lower_wick_pct,
        gap_pct,
    }
}

pub struct PivotColumns {
    pub pivot: Column,
    pub r1: Column,
    pub s1: Column,
}

/// Classic floor pivots from the previous bar's high, low and close.
pub fn pivots(highs: &[f64], lows: &[f64], closes: &[f64]) -> PivotColumns {
    let n = closes.len();
    let mut pivot = vec![None; n];
    let mut r1 = vec![None; n];
    let mut s1 = vec![None; n];
    for i in 1..n {
        let p = (highs[i - 1] + lows[i - 1] + closes[i - 1]) / 3.0;
        pivot[i] = Some(p);
        r1[i] = Some(2.0 * p - lows[i - 1]);
        s1[i] = Some(2.0 * p - highs[i - 1]);
    }
    PivotColumns { pivot, r1, s1 }
}
