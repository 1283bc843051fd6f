//! Window helpers shared by the indicator modules.

use super::Column;
use crate::env_config::models::engine_config::StdDevConvention;

/// Denominators with a smaller magnitude are treated as zero.
pub const EPSILON: f64 = 1e-12;

/// `num / den`, or `fallback` when the denominator is (near) zero.
#[inline]
pub fn safe_div(num: f64, den: f64, fallback: f64) -> f64 {
    if den.abs() < EPSILON { fallback } else { num / den }
}

pub fn rolling_max(values: &[f64], period: usize) -> Column {
    rolling_fold(values, period, f64::NEG_INFINITY, f64::max)
}

pub fn rolling_min(values: &[f64], period: usize) -> Column {
    rolling_fold(values, period, f64::INFINITY, f64::min)
}

pub fn rolling_sum(values: &[f64], period: usize) -> Column {
    rolling_fold(values, period, 0.0, |acc, v| acc + v)
}

fn rolling_fold<F>(values: &[f64], period: usize, init: f64, f: F) -> Column
where
    F: Fn(f64, f64) -> f64,
{
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..values.len() {
        out[i] = Some(values[i + 1 - period..=i].iter().copied().fold(init, &f));
    }
    out
}

/// Rolling standard deviation over fully defined windows.
pub fn rolling_std(values: &[Option<f64>], period: usize, convention: StdDevConvention) -> Column {
    let mut out = vec![None; values.len()];
    let min_len = match convention {
        StdDevConvention::Population => 1,
        StdDevConvention::Sample => 2,
    };
    if period < min_len {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window: Option<Vec<f64>> = values[i + 1 - period..=i].iter().copied().collect();
        if let Some(window) = window {
            out[i] = Some(std_dev(&window, convention));
        }
    }
    out
}

pub fn std_dev(window: &[f64], convention: StdDevConvention) -> f64 {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let squares = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    let denom = match convention {
        StdDevConvention::Population => n,
        StdDevConvention::Sample => n - 1.0,
    };
    safe_div(squares, denom, 0.0).max(0.0).sqrt()
}

/// Moves every value `periods` bars later; the first `periods` slots are null.
pub fn shift_forward(values: &[Option<f64>], periods: usize) -> Column {
    let mut out = vec![None; values.len()];
    for i in periods..values.len() {
        out[i] = values[i - periods];
    }
    out
}

/// Value `periods` bars earlier (a causal lag).
pub fn lag(values: &[Option<f64>], periods: usize) -> Column {
    shift_forward(values, periods)
}

/// Value `periods` bars later. Non-causal: only for training labels.
pub fn lead(values: &[Option<f64>], periods: usize) -> Column {
    let mut out = vec![None; values.len()];
    for i in 0..values.len().saturating_sub(periods) {
        out[i] = values[i + periods];
    }
    out
}

/// Определяет пересечение двух линий
///
/// `+1` when fast moves from at-or-below to above slow, `-1` for the mirror
/// case, `0` otherwise or when either bar is undefined. A cross is only
/// ever reported on the bar where it happens.
pub fn crossover(fast: &[Option<f64>], slow: &[Option<f64>]) -> Vec<i8> {
    let mut out = vec![0i8; fast.len()];
    for i in 1..fast.len() {
        if let (Some(prev_fast), Some(prev_slow), Some(curr_fast), Some(curr_slow)) =
            (fast[i - 1], slow[i - 1], fast[i], slow[i])
        {
            out[i] = determine_cross(prev_fast, prev_slow, curr_fast, curr_slow);
        }
    }
    out
}

fn determine_cross(prev_fast: f64, prev_slow: f64, curr_fast: f64, curr_slow: f64) -> i8 {
    // Пересечение снизу вверх
    if prev_fast <= prev_slow && curr_fast > curr_slow {
        return 1;
    }
    // Пересечение сверху вниз
    if prev_fast >= prev_slow && curr_fast < curr_slow {
        return -1;
    }
    0
}
