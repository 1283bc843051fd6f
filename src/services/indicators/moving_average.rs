//! Weighted moving averages. SMA and EMA live in [`super::smoothing`].

use super::Column;
use super::rolling::EPSILON;

/// Linearly weighted MA: the newest bar weighs `period`, the oldest 1.
pub fn wma(values: &[f64], period: usize) -> Column {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    let denom = (period * (period + 1)) as f64 / 2.0;
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let weighted: f64 = window
            .iter()
            .enumerate()
            .map(|(j, v)| v * (j + 1) as f64)
            .sum();
        out[i] = Some(weighted / denom);
    }
    out
}

/// Volume-weighted MA of closes. Null for volumeless assets; a window
/// with no traded volume falls back to the plain mean of its closes.
pub fn vwma(closes: &[f64], volumes: Option<&[f64]>, period: usize) -> Column {
    let mut out = vec![None; closes.len()];
    let Some(volumes) = volumes else {
        return out;
    };
    if period == 0 {
        return out;
    }
    for i in (period - 1)..closes.len() {
        let range = i + 1 - period..=i;
        let vol_sum: f64 = volumes[range.clone()].iter().sum();
        out[i] = if vol_sum.abs() < EPSILON {
            Some(closes[range].iter().sum::<f64>() / period as f64)
        } else {
            let pv: f64 = closes[range.clone()]
                .iter()
                .zip(&volumes[range])
                .map(|(c, v)| c * v)
                .sum();
            Some(pv / vol_sum)
        };
    }
    out
}
