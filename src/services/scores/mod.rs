// File: src/services/scores/mod.rs
pub mod cycle;
pub mod flags;
pub mod growth;
pub mod nested;
pub mod regime;

pub use nested::{EntrySignal, NestedAligner, NestedScore, Recommendation, TimeframeInput};
pub use regime::TrendRegime;

use crate::env_config::models::engine_config::EngineConfig;
use crate::services::indicators::IndicatorFrame;
use crate::services::indicators::rolling::crossover;
use serde::Serialize;

/// Composite scores and derived flags, one entry per bar.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreFrame {
    pub growth_score: Vec<Option<u8>>,
    pub in_rise_cycle: Vec<Option<bool>>,
    pub rise_cycle_start: Vec<bool>,
    pub fall_cycle_start: Vec<bool>,
    pub cycle_bars: Vec<Option<u32>>,
    pub rise_cycle_score: Vec<Option<u8>>,
    pub trend_regime: Vec<Option<TrendRegime>>,
    pub rsi_zone: Vec<Option<i8>>,
    pub golden_cross_flag: Vec<i8>,
    pub volume_anomaly: Vec<Option<bool>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreValues {
    pub growth_score: Option<u8>,
    pub in_rise_cycle: Option<bool>,
    pub rise_cycle_start: bool,
    pub fall_cycle_start: bool,
    pub cycle_bars: Option<u32>,
    pub rise_cycle_score: Option<u8>,
    pub trend_regime: Option<TrendRegime>,
    pub rsi_zone: Option<i8>,
    pub golden_cross_flag: i8,
    pub volume_anomaly: Option<bool>,
}

impl ScoreFrame {
    pub fn len(&self) -> usize {
        self.growth_score.len()
    }

    pub fn is_empty(&self) -> bool {
        self.growth_score.is_empty()
    }

    pub fn values_at(&self, i: usize) -> ScoreValues {
        ScoreValues {
            growth_score: self.growth_score.get(i).copied().flatten(),
            in_rise_cycle: self.in_rise_cycle.get(i).copied().flatten(),
            rise_cycle_start: self.rise_cycle_start.get(i).copied().unwrap_or(false),
            fall_cycle_start: self.fall_cycle_start.get(i).copied().unwrap_or(false),
            cycle_bars: self.cycle_bars.get(i).copied().flatten(),
            rise_cycle_score: self.rise_cycle_score.get(i).copied().flatten(),
            trend_regime: self.trend_regime.get(i).copied().flatten(),
            rsi_zone: self.rsi_zone.get(i).copied().flatten(),
            golden_cross_flag: self.golden_cross_flag.get(i).copied().unwrap_or(0),
            volume_anomaly: self.volume_anomaly.get(i).copied().flatten(),
        }
    }
}

/// Single-timeframe composite scores over an already computed frame.
pub fn compute_scores(closes: &[f64], frame: &IndicatorFrame, config: &EngineConfig) -> ScoreFrame {
    let cycle = cycle::rise_fall_cycle(&frame.ema_12, &frame.ema_26);
    ScoreFrame {
        growth_score: growth::growth_score(closes, frame, &config.growth),
        in_rise_cycle: cycle.in_rise_cycle,
        rise_cycle_start: cycle.rise_cycle_start,
        fall_cycle_start: cycle.fall_cycle_start,
        cycle_bars: cycle.cycle_bars,
        rise_cycle_score: cycle::rise_cycle_score(closes, frame, &config.cycle_score),
        trend_regime: regime::trend_regime(closes, frame, &config.regime),
        rsi_zone: flags::rsi_zone(&frame.rsi, &config.flags),
        golden_cross_flag: crossover(&frame.sma_50, &frame.sma_200),
        volume_anomaly: flags::volume_anomaly(&frame.volume_zscore, &config.flags),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::indicators::compute_indicators;
    use crate::services::normalizer::test_support::*;

    #[test]
    fn test_scores_align_with_frame() {
        let series = wave_series(260);
        let config = EngineConfig::default();
        let frame = compute_indicators(&series, &config);
        let scores = compute_scores(&series.closes(), &frame, &config);
        assert_eq!(scores.len(), 260);
        assert!(scores.growth_score[198].is_none());
        for score in scores.growth_score.iter().flatten() {
            assert!(score % 25 == 0 && *score <= 100);
        }
        for score in scores.rise_cycle_score.iter().flatten() {
            assert!(*score <= 10);
        }
        assert!(scores.trend_regime[259].is_some());
    }

    #[test]
    fn test_values_at_out_of_range() {
        let frame = IndicatorFrame::with_len(0);
        let scores = compute_scores(&[], &frame, &EngineConfig::default());
        assert!(scores.is_empty());
        assert!(!scores.values_at(3).rise_cycle_start);
        assert_eq!(scores.values_at(3).growth_score, None);
    }
}
