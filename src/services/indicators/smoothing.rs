//! Smoothing families over nullable columns.
//!
//! Two families are kept strictly apart: the simple family (arithmetic
//! mean of the last `period` values) and the recursive family (EMA and
//! Wilder RMA). RSI, ATR and ADX go through [`smooth`] with the method
//! pinned in configuration; the default is Wilder.
//!
//! Null handling shared by every helper: leading nulls are skipped, a
//! null inside the seed window restarts seeding, and a null after the
//! seed produces a null output while keeping the running state.

use super::Column;
use crate::env_config::models::engine_config::SmoothingMethod;

/// Lifts a dense column into a nullable one.
pub fn lift(values: &[f64]) -> Column {
    values.iter().copied().map(Some).collect()
}

/// Simple moving average. Undefined until `period` non-null values exist
/// in the window.
pub fn sma(values: &[Option<f64>], period: usize) -> Column {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let mut sum = 0.0;
        let mut complete = true;
        for v in window {
            match v {
                Some(x) => sum += x,
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            out[i] = Some(sum / period as f64);
        }
    }
    out
}

/// Exponential moving average, alpha = 2/(period + 1), seeded with the
/// SMA of the first `period` values.
pub fn ema(values: &[Option<f64>], period: usize) -> Column {
    let alpha = 2.0 / (period as f64 + 1.0);
    seeded(values, period, |prev, value| prev + alpha * (value - prev))
}

/// Wilder's RMA: `rma[0] = SMA(values[0..period])`,
/// `rma[i] = (rma[i-1] * (period - 1) + values[i]) / period`.
pub fn rma(values: &[Option<f64>], period: usize) -> Column {
    let p = period as f64;
    seeded(values, period, |prev, value| (prev * (p - 1.0) + value) / p)
}

/// The single dispatch point for configurable smoothing.
pub fn smooth(values: &[Option<f64>], period: usize, method: SmoothingMethod) -> Column {
    match method {
        SmoothingMethod::Wilder => rma(values, period),
        SmoothingMethod::Simple => sma(values, period),
        SmoothingMethod::Exponential => ema(values, period),
    }
}

fn seeded<F>(values: &[Option<f64>], period: usize, step: F) -> Column
where
    F: Fn(f64, f64) -> f64,
{
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    let mut state: Option<f64> = None;
    let mut seed_sum = 0.0;
    let mut seed_len = 0usize;

    for (i, value) in values.iter().enumerate() {
        match (state, value) {
            (None, Some(v)) => {
                seed_sum += v;
                seed_len += 1;
                if seed_len == period {
                    let initial = seed_sum / period as f64;
                    state = Some(initial);
                    out[i] = Some(initial);
                }
            }
            (None, None) => {
                seed_sum = 0.0;
                seed_len = 0;
            }
            (Some(prev), Some(v)) => {
                let next = step(prev, *v);
                state = Some(next);
                out[i] = Some(next);
            }
            (Some(_), None) => {}
        }
    }
    out
}
