//! Moving Average Convergence Divergence.

use super::Column;
use super::rolling::crossover;
use super::smoothing::{ema, lift};

pub struct MacdColumns {
    pub macd: Column,
    pub signal: Column,
    pub histogram: Column,
    /// `+1`/`-1` exactly on the bar where MACD crosses its signal line.
    pub cross_flag: Vec<i8>,
}

/// `macd = EMA_fast - EMA_slow`, `signal = EMA_signal(macd)`,
/// `histogram = macd - signal`.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdColumns {
    let values = lift(closes);
    let fast_ema = ema(&values, fast);
    let slow_ema = ema(&values, slow);

    let macd: Column = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal = ema(&macd, signal_period);
    let histogram: Column = macd
        .iter()
        .zip(&signal)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();
    let cross_flag = crossover(&macd, &signal);

    MacdColumns {
        macd,
        signal,
        histogram,
        cross_flag,
    }
}
