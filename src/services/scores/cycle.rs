// File: src/services/scores/cycle.rs
use crate::env_config::models::engine_config::CycleScoreConfig;
use crate::services::indicators::IndicatorFrame;

/// Rise/fall cycle state driven by EMA 12 against EMA 26.
pub struct CycleColumns {
    pub in_rise_cycle: Vec<Option<bool>>,
    pub rise_cycle_start: Vec<bool>,
    pub fall_cycle_start: Vec<bool>,
    /// Consecutive bars in the current state, the current bar included.
    pub cycle_bars: Vec<Option<u32>>,
}

pub fn rise_fall_cycle(fast: &[Option<f64>], slow: &[Option<f64>]) -> CycleColumns {
    let n = fast.len();
    let in_rise_cycle: Vec<Option<bool>> = fast
        .iter()
        .zip(slow)
        .map(|(f, s)| Some((*f)? > (*s)?))
        .collect();

    let mut rise_cycle_start = vec![false; n];
    let mut fall_cycle_start = vec![false; n];
    let mut cycle_bars = vec![None; n];

    let mut run = 0u32;
    for i in 0..n {
        let Some(current) = in_rise_cycle[i] else {
            run = 0;
            continue;
        };
        match i.checked_sub(1).and_then(|p| in_rise_cycle[p]) {
            Some(previous) if previous == current => run += 1,
            Some(previous) => {
                // Смена состояния на этом баре
                rise_cycle_start[i] = current && !previous;
                fall_cycle_start[i] = !current && previous;
                run = 1;
            }
            None => run = 1,
        }
        cycle_bars[i] = Some(run);
    }

    CycleColumns {
        in_rise_cycle,
        rise_cycle_start,
        fall_cycle_start,
        cycle_bars,
    }
}

/// Rise Cycle Score in [0, 10]: one point per bullish check.
/// Null when any input is undefined.
pub fn rise_cycle_score(closes: &[f64], frame: &IndicatorFrame, config: &CycleScoreConfig) -> Vec<Option<u8>> {
    (0..closes.len())
        .map(|i| {
            let close = closes[i];
            let prev_histogram = frame.macd_histogram[i.checked_sub(1)?]?;
            let checks = [
                frame.ema_12[i]? > frame.ema_26[i]?,
                close > frame.sma_20[i]?,
                close > frame.sma_50[i]?,
                close > frame.sma_200[i]?,
                frame.sma_50[i]? > frame.sma_200[i]?,
                frame.macd[i]? > frame.macd_signal[i]?,
                frame.macd_histogram[i]? > prev_histogram,
                frame.rsi[i]? > config.rsi_bullish,
                frame.adx[i]? > config.adx_trend && frame.plus_di[i]? > frame.minus_di[i]?,
                frame.stoch_k[i]? > frame.stoch_d[i]?,
            ];
            Some(checks.iter().filter(|c| **c).count() as u8)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rise_start_fires_once_on_transition() {
        let fast = [None, Some(1.0), Some(1.0), Some(3.0), Some(4.0), Some(5.0)];
        let slow = [None, Some(2.0), Some(2.0), Some(2.0), Some(2.0), Some(2.0)];
        let out = rise_fall_cycle(&fast, &slow);
        assert_eq!(out.in_rise_cycle[0], None);
        assert_eq!(out.rise_cycle_start, vec![false, false, false, true, false, false]);
        assert!(out.fall_cycle_start.iter().all(|f| !f));
        assert_eq!(out.cycle_bars, vec![None, Some(1), Some(2), Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_fall_start_is_symmetric() {
        let fast = [Some(3.0), Some(1.0), Some(1.0)];
        let slow = [Some(2.0), Some(2.0), Some(2.0)];
        let out = rise_fall_cycle(&fast, &slow);
        assert_eq!(out.fall_cycle_start, vec![false, true, false]);
        assert_eq!(out.rise_cycle_start, vec![false, false, false]);
    }

    #[test]
    fn test_first_defined_bar_is_not_an_event() {
        let fast = [None, Some(3.0)];
        let slow = [None, Some(2.0)];
        let out = rise_fall_cycle(&fast, &slow);
        assert!(!out.rise_cycle_start[1]);
        assert_eq!(out.in_rise_cycle[1], Some(true));
    }

    #[test]
    fn test_rise_cycle_score_counts_checks() {
        let mut frame = IndicatorFrame::with_len(2);
        let set = |v: f64| vec![Some(v), Some(v)];
        frame.ema_12 = set(11.0);
        frame.ema_26 = set(10.0);
        frame.sma_20 = set(90.0);
        frame.sma_50 = set(95.0);
        frame.sma_200 = set(80.0);
        frame.macd = set(1.0);
        frame.macd_signal = set(0.5);
        frame.macd_histogram = vec![Some(0.2), Some(0.5)];
        frame.rsi = set(60.0);
        frame.adx = set(30.0);
        frame.plus_di = set(25.0);
        frame.minus_di = set(15.0);
        frame.stoch_k = set(70.0);
        frame.stoch_d = set(60.0);

        let config = CycleScoreConfig::default();
        let out = rise_cycle_score(&[100.0, 100.0], &frame, &config);
        // no previous histogram on the first bar
        assert_eq!(out[0], None);
        assert_eq!(out[1], Some(10));

        frame.rsi = set(40.0);
        frame.stoch_k = set(50.0);
        assert_eq!(rise_cycle_score(&[100.0, 100.0], &frame, &config)[1], Some(8));
    }
}
