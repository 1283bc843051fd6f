//! Trend strength: ADX with directional indicators, Aroon.

use super::Column;
use super::rolling::safe_div;
use super::smoothing::smooth;
use super::volatility::true_range;
use crate::env_config::models::engine_config::SmoothingMethod;

pub struct AdxColumns {
    pub adx: Column,
    pub plus_di: Column,
    pub minus_di: Column,
}

/// Average Directional Index.
///
/// +DM, -DM and TR are smoothed with `method` (Wilder by default), DX is
/// `100 * |+DI - -DI| / (+DI + -DI)` and ADX is the same smoothing of DX.
/// Zero denominators give 0.
pub fn adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize, method: SmoothingMethod) -> AdxColumns {
    let n = closes.len();
    let mut plus_dm = vec![None; n];
    let mut minus_dm = vec![None; n];
    for i in 1..n {
        let up_move = highs[i] - highs[i - 1];
        let down_move = lows[i - 1] - lows[i];
        plus_dm[i] = Some(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm[i] = Some(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
    }

    let tr = true_range(highs, lows, closes);
    let smoothed_tr = smooth(&tr, period, method);
    let smoothed_plus = smooth(&plus_dm, period, method);
    let smoothed_minus = smooth(&minus_dm, period, method);

    let mut plus_di = vec![None; n];
    let mut minus_di = vec![None; n];
    let mut dx = vec![None; n];
    for i in 0..n {
        let (Some(atr), Some(p), Some(m)) = (smoothed_tr[i], smoothed_plus[i], smoothed_minus[i]) else {
            continue;
        };
        let pdi = (100.0 * safe_div(p, atr, 0.0)).clamp(0.0, 100.0);
        let mdi = (100.0 * safe_div(m, atr, 0.0)).clamp(0.0, 100.0);
        plus_di[i] = Some(pdi);
        minus_di[i] = Some(mdi);
        dx[i] = Some((100.0 * safe_div((pdi - mdi).abs(), pdi + mdi, 0.0)).clamp(0.0, 100.0));
    }

    let adx = smooth(&dx, period, method)
        .into_iter()
        .map(|v| v.map(|x| x.clamp(0.0, 100.0)))
        .collect();

    AdxColumns {
        adx,
        plus_di,
        minus_di,
    }
}

pub struct AroonColumns {
    pub up: Column,
    pub down: Column,
    pub oscillator: Column,
}

/// Aroon over `period + 1` bars; ties resolve to the most recent extreme.
pub fn aroon(highs: &[f64], lows: &[f64], period: usize) -> AroonColumns {
    let n = highs.len();
    let mut up = vec![None; n];
    let mut down = vec![None; n];
    let mut oscillator = vec![None; n];
    if period == 0 {
        return AroonColumns { up, down, oscillator };
    }

    for i in period..n {
        let start = i - period;
        let mut hi_idx = start;
        let mut lo_idx = start;
        for j in start..=i {
            if highs[j] >= highs[hi_idx] {
                hi_idx = j;
            }
            if lows[j] <= lows[lo_idx] {
                lo_idx = j;
            }
        }
        let p = period as f64;
        let u = 100.0 * (p - (i - hi_idx) as f64) / p;
        let d = 100.0 * (p - (i - lo_idx) as f64) / p;
        up[i] = Some(u);
        down[i] = Some(d);
        oscillator[i] = Some(u - d);
    }

    AroonColumns { up, down, oscillator }
}
