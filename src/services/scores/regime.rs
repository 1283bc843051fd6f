// File: src/services/scores/regime.rs
use crate::env_config::models::engine_config::RegimeConfig;
use crate::services::indicators::IndicatorFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendRegime {
    StrongUptrend,
    WeakUptrend,
    Consolidation,
    WeakDowntrend,
    StrongDowntrend,
}

impl TrendRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendRegime::StrongUptrend => "STRONG_UPTREND",
            TrendRegime::WeakUptrend => "WEAK_UPTREND",
            TrendRegime::Consolidation => "CONSOLIDATION",
            TrendRegime::WeakDowntrend => "WEAK_DOWNTREND",
            TrendRegime::StrongDowntrend => "STRONG_DOWNTREND",
        }
    }
}

impl fmt::Display for TrendRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Классифицирует режим тренда. Ветки проверяются строго по порядку.
pub fn classify(close: f64, sma_50: f64, sma_200: f64, adx: f64, config: &RegimeConfig) -> TrendRegime {
    let strong = adx > config.adx_strong;
    if close > sma_50 && sma_50 > sma_200 && strong {
        TrendRegime::StrongUptrend
    } else if close > sma_50 && close > sma_200 {
        TrendRegime::WeakUptrend
    } else if close < sma_50 && sma_50 < sma_200 && strong {
        TrendRegime::StrongDowntrend
    } else if close < sma_50 && close < sma_200 {
        TrendRegime::WeakDowntrend
    } else {
        TrendRegime::Consolidation
    }
}

pub fn trend_regime(closes: &[f64], frame: &IndicatorFrame, config: &RegimeConfig) -> Vec<Option<TrendRegime>> {
    (0..closes.len())
        .map(|i| {
            Some(classify(
                closes[i],
                frame.sma_50[i]?,
                frame.sma_200[i]?,
                frame.adx[i]?,
                config,
            ))
        })
        .collect()
}
