// File: src/services/targets.rs
//! Forward-looking training labels and causal lagged features.
//!
//! Target columns read future bars and belong to the training view only.

use crate::env_config::models::engine_config::TargetConfig;
use crate::services::indicators::rolling::{lag, lead, safe_div};
use crate::services::indicators::smoothing::lift;
use crate::services::indicators::{Column, IndicatorFrame};
use crate::types::SortedBarSeries;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct TargetFrame {
    pub target_return_1d: Column,
    pub target_return_5d: Column,
    /// 1 when the next close is higher, else 0; null on the last bar.
    pub target_direction_1d: Vec<Option<u8>>,
    /// -1, 0 or 1 by the next bar's percent change against the neutral band.
    pub target_signal_1d: Vec<Option<i8>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetValues {
    pub target_return_1d: Option<f64>,
    pub target_return_5d: Option<f64>,
    pub target_direction_1d: Option<u8>,
    pub target_signal_1d: Option<i8>,
}

impl TargetFrame {
    pub fn values_at(&self, i: usize) -> TargetValues {
        TargetValues {
            target_return_1d: self.target_return_1d.get(i).copied().flatten(),
            target_return_5d: self.target_return_5d.get(i).copied().flatten(),
            target_direction_1d: self.target_direction_1d.get(i).copied().flatten(),
            target_signal_1d: self.target_signal_1d.get(i).copied().flatten(),
        }
    }
}

pub fn compute_targets(closes: &[f64], config: &TargetConfig) -> TargetFrame {
    let values = lift(closes);
    let next = lead(&values, 1);
    let fifth = lead(&values, 5);

    let forward = |future: &[Option<f64>]| -> Column {
        closes
            .iter()
            .zip(future)
            .map(|(c, f)| Some(safe_div((*f)? - c, *c, 0.0)))
            .collect()
    };
    let target_return_1d = forward(&next);
    let target_return_5d = forward(&fifth);

    let target_direction_1d = closes
        .iter()
        .zip(&next)
        .map(|(c, n)| Some(u8::from((*n)? > *c)))
        .collect();
    let target_signal_1d = target_return_1d
        .iter()
        .map(|r| Some(future_signal((*r)? * 100.0, config.neutral_band_pct)))
        .collect();

    TargetFrame {
        target_return_1d,
        target_return_5d,
        target_direction_1d,
        target_signal_1d,
    }
}

/// Определение сигнала по изменению цены в процентах
fn future_signal(price_change_pct: f64, band: f64) -> i8 {
    if price_change_pct > band {
        1 // Рост
    } else if price_change_pct < -band {
        -1 // Падение
    } else {
        0 // Боковик
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaggedFrame {
    pub close_lag_1: Column,
    pub close_lag_5: Column,
    pub return_1_lag_1: Column,
    pub rsi_lag_1: Column,
    pub macd_histogram_lag_1: Column,
    pub volume_lag_1: Column,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaggedValues {
    pub close_lag_1: Option<f64>,
    pub close_lag_5: Option<f64>,
    pub return_1_lag_1: Option<f64>,
    pub rsi_lag_1: Option<f64>,
    pub macd_histogram_lag_1: Option<f64>,
    pub volume_lag_1: Option<f64>,
}

impl LaggedFrame {
    pub fn values_at(&self, i: usize) -> LaggedValues {
        let at = |column: &Column| column.get(i).copied().flatten();
        LaggedValues {
            close_lag_1: at(&self.close_lag_1),
            close_lag_5: at(&self.close_lag_5),
            return_1_lag_1: at(&self.return_1_lag_1),
            rsi_lag_1: at(&self.rsi_lag_1),
            macd_histogram_lag_1: at(&self.macd_histogram_lag_1),
            volume_lag_1: at(&self.volume_lag_1),
        }
    }
}

/// Causal lags of selected inputs; volume lags are null for volumeless assets.
pub fn compute_lagged(series: &SortedBarSeries, frame: &IndicatorFrame) -> LaggedFrame {
    let closes = lift(&series.closes());
    let volume_lag_1 = match series.volumes() {
        Some(volumes) => lag(&lift(&volumes), 1),
        None => vec![None; series.len()],
    };
    LaggedFrame {
        close_lag_1: lag(&closes, 1),
        close_lag_5: lag(&closes, 5),
        return_1_lag_1: lag(&frame.return_1, 1),
        rsi_lag_1: lag(&frame.rsi, 1),
        macd_histogram_lag_1: lag(&frame.macd_histogram, 1),
        volume_lag_1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalizer::test_support::*;

    #[test]
    fn test_forward_returns_and_direction() {
        let closes = [100.0, 101.0, 100.0, 100.0, 102.0, 103.0, 104.0];
        let out = compute_targets(&closes, &TargetConfig::default());
        assert!((out.target_return_1d[0].unwrap() - 0.01).abs() < 1e-12);
        assert_eq!(out.target_direction_1d[0], Some(1));
        assert_eq!(out.target_direction_1d[1], Some(0));
        // flat is not up
        assert_eq!(out.target_direction_1d[2], Some(0));
        assert_eq!(out.target_direction_1d[6], None);
        assert_eq!(out.target_return_1d[6], None);

        assert!((out.target_return_5d[0].unwrap() - 0.03).abs() < 1e-12);
        assert!(out.target_return_5d[1].is_some());
        assert_eq!(out.target_return_5d[2], None);
    }

    #[test]
    fn test_signal_respects_neutral_band() {
        let closes = [100.0, 100.1, 100.5, 100.0];
        let out = compute_targets(&closes, &TargetConfig::default());
        // +0.1% is inside the 0.2% band
        assert_eq!(out.target_signal_1d[0], Some(0));
        assert_eq!(out.target_signal_1d[1], Some(1));
        assert_eq!(out.target_signal_1d[2], Some(-1));
        assert_eq!(out.target_signal_1d[3], None);
    }

    #[test]
    fn test_lagged_features_are_causal() {
        let series = series_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let mut frame = IndicatorFrame::with_len(7);
        frame.rsi = (0..7).map(|i| Some(i as f64)).collect();
        let out = compute_lagged(&series, &frame);
        assert_eq!(out.close_lag_1[0], None);
        assert_eq!(out.close_lag_1[1], Some(10.0));
        assert_eq!(out.close_lag_5[5], Some(10.0));
        assert_eq!(out.close_lag_5[4], None);
        assert_eq!(out.rsi_lag_1[3], Some(2.0));
        assert_eq!(out.volume_lag_1[2], Some(1_001.0));
    }
}
