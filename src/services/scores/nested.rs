// File: src/services/scores/nested.rs
//! Nested multi-timeframe score.
//!
//! Evaluated at every hourly bar. Alignment is as-of on bar close times,
//! so a row only sees bars that had already closed: the latest daily bar
//! closed at or before the hourly close, and the 5-minute bars closed
//! inside `(as_of - fivemin_window_minutes, as_of]`.

use crate::env_config::models::engine_config::{EntryBands, NestedConfig, RecommendationBands};
use crate::error::EngineError;
use crate::services::indicators::IndicatorFrame;
use crate::types::SortedBarSeries;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntrySignal {
    Execute,
    Ready,
    Watch,
    Wait,
}

impl EntrySignal {
    pub fn from_score(score: Option<f64>, aligned: bool, bands: &EntryBands) -> Self {
        match score {
            Some(s) if aligned && s >= bands.execute => EntrySignal::Execute,
            Some(s) if s >= bands.ready => EntrySignal::Ready,
            Some(s) if s >= bands.watch => EntrySignal::Watch,
            _ => EntrySignal::Wait,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySignal::Execute => "EXECUTE",
            EntrySignal::Ready => "READY",
            EntrySignal::Watch => "WATCH",
            EntrySignal::Wait => "WAIT",
        }
    }
}

impl fmt::Display for EntrySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    UltraBuy,
    StrongBuy,
    Buy,
    WeakBuy,
    Hold,
}

impl Recommendation {
    pub fn from_score(score: Option<f64>, bands: &RecommendationBands) -> Self {
        match score {
            Some(s) if s >= bands.ultra_buy => Recommendation::UltraBuy,
            Some(s) if s >= bands.strong_buy => Recommendation::StrongBuy,
            Some(s) if s >= bands.buy => Recommendation::Buy,
            Some(s) if s >= bands.weak_buy => Recommendation::WeakBuy,
            _ => Recommendation::Hold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::UltraBuy => "ULTRA_BUY",
            Recommendation::StrongBuy => "STRONG_BUY",
            Recommendation::Buy => "BUY",
            Recommendation::WeakBuy => "WEAK_BUY",
            Recommendation::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timeframe's bars with their computed indicators.
#[derive(Clone, Copy)]
pub struct TimeframeInput<'a> {
    pub series: &'a SortedBarSeries,
    pub frame: &'a IndicatorFrame,
}

/// Nested score at one hourly bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedScore {
    #[serde(skip)]
    pub timestamp: DateTime<Utc>,
    /// Close time of the hourly bar; every input closed at or before it.
    #[serde(skip)]
    pub as_of: DateTime<Utc>,
    pub daily_ema_bullish: Option<bool>,
    pub daily_macd_bullish: Option<bool>,
    pub daily_price_up: Option<bool>,
    pub daily_score: Option<f64>,
    pub hourly_ema_bullish: Option<bool>,
    pub hourly_macd_bullish: Option<bool>,
    pub hourly_price_up: Option<bool>,
    pub hourly_score: Option<f64>,
    pub fivemin_bars: u32,
    pub fivemin_ema_pct: Option<f64>,
    pub fivemin_macd_pct: Option<f64>,
    pub fivemin_price_up_pct: Option<f64>,
    pub fivemin_score: Option<f64>,
    pub enhanced_nested_score: Option<f64>,
    pub all_timeframes_aligned: bool,
    pub entry_signal: EntrySignal,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct BarChecks {
    ema_bullish: Option<bool>,
    macd_bullish: Option<bool>,
    price_up: Option<bool>,
}

impl BarChecks {
    fn complete(&self) -> Option<[bool; 3]> {
        Some([self.ema_bullish?, self.macd_bullish?, self.price_up?])
    }

    /// 100 · (true checks) / 3, null while any check is undefined.
    fn score(&self) -> Option<f64> {
        let checks = self.complete()?;
        Some(100.0 * checks.iter().filter(|c| **c).count() as f64 / 3.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct FiveMinuteAggregate {
    bars: u32,
    ema_pct: Option<f64>,
    macd_pct: Option<f64>,
    price_up_pct: Option<f64>,
    score: Option<f64>,
}

/// Share of bullish checks over the rows where all three are defined.
fn aggregate(checks: &[BarChecks]) -> FiveMinuteAggregate {
    let complete: Vec<[bool; 3]> = checks.iter().filter_map(BarChecks::complete).collect();
    if complete.is_empty() {
        return FiveMinuteAggregate {
            bars: checks.len() as u32,
            ..FiveMinuteAggregate::default()
        };
    }
    let total = complete.len() as f64;
    let pct = |k: usize| complete.iter().filter(|c| c[k]).count() as f64 / total;
    let (ema, macd, price) = (pct(0), pct(1), pct(2));
    FiveMinuteAggregate {
        bars: checks.len() as u32,
        ema_pct: Some(ema),
        macd_pct: Some(macd),
        price_up_pct: Some(price),
        score: Some(100.0 * (ema + macd + price) / 3.0),
    }
}

fn bar_checks(input: &TimeframeInput<'_>) -> Vec<BarChecks> {
    let frame = input.frame;
    let closes = input.series.closes();
    let above = |a: Option<f64>, b: Option<f64>| Some(a? > b?);
    (0..closes.len())
        .map(|i| BarChecks {
            ema_bullish: above(frame.ema_12[i], frame.ema_26[i]),
            macd_bullish: above(frame.macd[i], frame.macd_signal[i]),
            price_up: i.checked_sub(1).map(|p| closes[i] > closes[p]),
        })
        .collect()
}

pub struct NestedAligner<'a> {
    config: &'a NestedConfig,
}

impl<'a> NestedAligner<'a> {
    pub fn new(config: &'a NestedConfig) -> Self {
        Self { config }
    }

    /// Scores every hourly bar against the daily and 5-minute series of
    /// the same symbol.
    pub fn align(
        &self,
        daily: TimeframeInput<'_>,
        hourly: TimeframeInput<'_>,
        fivemin: TimeframeInput<'_>,
    ) -> Result<Vec<NestedScore>, EngineError> {
        for input in [&daily, &hourly, &fivemin] {
            if input.frame.len() != input.series.len() || !input.frame.is_aligned() {
                return Err(EngineError::FrameLengthMismatch {
                    symbol: input.series.symbol().to_string(),
                    timeframe: input.series.timeframe().to_string(),
                    series_len: input.series.len(),
                    frame_len: input.frame.len(),
                });
            }
        }

        let symbol = hourly.series.symbol();
        for other in [daily.series, fivemin.series] {
            if other.symbol() != symbol {
                return Err(EngineError::MixedSymbols {
                    expected: symbol.to_string(),
                    found: other.symbol().to_string(),
                });
            }
        }

        let daily_checks = bar_checks(&daily);
        let hourly_checks = bar_checks(&hourly);
        let fivemin_checks = bar_checks(&fivemin);
        let daily_close = daily.series.close_times();
        let fivemin_close = fivemin.series.close_times();
        let window = Duration::minutes(self.config.fivemin_window_minutes);

        let scores: Vec<NestedScore> = hourly
            .series
            .bars()
            .iter()
            .zip(&hourly_checks)
            .map(|(bar, hourly_row)| {
                let as_of = bar.close_time();

                // Последний дневной бар, закрытый не позже часового
                let closed = daily_close.partition_point(|t| *t <= as_of);
                let daily_row = closed
                    .checked_sub(1)
                    .map(|i| daily_checks[i])
                    .unwrap_or_default();

                let start = fivemin_close.partition_point(|t| *t <= as_of - window);
                let end = fivemin_close.partition_point(|t| *t <= as_of);
                let fivemin_row = aggregate(&fivemin_checks[start..end]);

                self.score_row(bar.timestamp, as_of, daily_row, *hourly_row, fivemin_row)
            })
            .collect();

        debug!(
            "Aligned {} hourly rows for {} (daily={}, five_minute={})",
            scores.len(),
            symbol,
            daily.series.len(),
            fivemin.series.len()
        );
        Ok(scores)
    }

    fn score_row(
        &self,
        timestamp: DateTime<Utc>,
        as_of: DateTime<Utc>,
        daily: BarChecks,
        hourly: BarChecks,
        fivemin: FiveMinuteAggregate,
    ) -> NestedScore {
        let daily_score = daily.score();
        let hourly_score = hourly.score();
        let enhanced_nested_score = self.weighted(daily_score, hourly_score, fivemin.score);

        let all_timeframes_aligned = daily.ema_bullish == Some(true)
            && hourly.ema_bullish == Some(true)
            && fivemin
                .ema_pct
                .is_some_and(|pct| pct >= self.config.fivemin_bullish_pct);

        NestedScore {
            timestamp,
            as_of,
            daily_ema_bullish: daily.ema_bullish,
            daily_macd_bullish: daily.macd_bullish,
            daily_price_up: daily.price_up,
            daily_score,
            hourly_ema_bullish: hourly.ema_bullish,
            hourly_macd_bullish: hourly.macd_bullish,
            hourly_price_up: hourly.price_up,
            hourly_score,
            fivemin_bars: fivemin.bars,
            fivemin_ema_pct: fivemin.ema_pct,
            fivemin_macd_pct: fivemin.macd_pct,
            fivemin_price_up_pct: fivemin.price_up_pct,
            fivemin_score: fivemin.score,
            enhanced_nested_score,
            all_timeframes_aligned,
            entry_signal: EntrySignal::from_score(
                enhanced_nested_score,
                all_timeframes_aligned,
                &self.config.entry,
            ),
            recommendation: Recommendation::from_score(
                enhanced_nested_score,
                &self.config.recommendation,
            ),
        }
    }

    /// Weighted mean of the three sub-scores; null while any is undefined.
    fn weighted(&self, daily: Option<f64>, hourly: Option<f64>, fivemin: Option<f64>) -> Option<f64> {
        let c = self.config;
        let total = c.daily_weight + c.hourly_weight + c.fivemin_weight;
        let sum = c.daily_weight * daily? + c.hourly_weight * hourly? + c.fivemin_weight * fivemin?;
        Some(sum / total)
    }
}
