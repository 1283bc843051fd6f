// File: src/services/assembler.rs
//! Joins bars, indicators, scores, lags and targets into upsert-ready rows
//! keyed by `(symbol, timestamp)`.

use crate::services::indicators::frame::sanitize;
use crate::services::indicators::{IndicatorFrame, IndicatorValues};
use crate::services::scores::{NestedScore, ScoreFrame, ScoreValues};
use crate::services::targets::{LaggedFrame, LaggedValues, TargetFrame, TargetValues};
use crate::types::{AssetType, SortedBarSeries, Timeframe};
use chrono::{Datelike, Timelike};
use serde::Serialize;
use tracing::debug;

/// Stamp shared by every row of one recompute run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStamp {
    pub logic_version: String,
    /// Epoch seconds, injected by the caller.
    pub computed_at: i64,
}

/// Training view: every feature plus the forward-looking targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRecord {
    pub symbol: String,
    pub asset_type: AssetType,
    pub timeframe: Timeframe,
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Null for volumeless assets.
    pub volume: Option<f64>,
    pub hour_of_day: u8,
    /// 1 = Monday
    pub day_of_week: u8,
    #[serde(flatten)]
    pub indicators: IndicatorValues,
    #[serde(flatten)]
    pub scores: ScoreValues,
    #[serde(flatten)]
    pub lagged: LaggedValues,
    #[serde(flatten)]
    pub targets: TargetValues,
    pub logic_version: String,
    pub computed_at: i64,
}

/// Live view: the same features with no target columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveFeatureRecord {
    pub symbol: String,
    pub asset_type: AssetType,
    pub timeframe: Timeframe,
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    pub hour_of_day: u8,
    pub day_of_week: u8,
    #[serde(flatten)]
    pub indicators: IndicatorValues,
    #[serde(flatten)]
    pub scores: ScoreValues,
    #[serde(flatten)]
    pub lagged: LaggedValues,
    pub logic_version: String,
    pub computed_at: i64,
}

impl SignalRecord {
    pub fn live_view(&self) -> LiveFeatureRecord {
        LiveFeatureRecord {
            symbol: self.symbol.clone(),
            asset_type: self.asset_type,
            timeframe: self.timeframe,
            timestamp: self.timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            hour_of_day: self.hour_of_day,
            day_of_week: self.day_of_week,
            indicators: self.indicators.clone(),
            scores: self.scores.clone(),
            lagged: self.lagged.clone(),
            logic_version: self.logic_version.clone(),
            computed_at: self.computed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedScoreRecord {
    pub symbol: String,
    pub timestamp: i64,
    pub as_of: i64,
    #[serde(flatten)]
    pub score: NestedScore,
    pub logic_version: String,
    pub computed_at: i64,
}

/// Rows of one symbol and timeframe, sorted by timestamp and unique per key.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertBatch<R> {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub logic_version: String,
    pub records: Vec<R>,
}

impl<R> UpsertBatch<R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Column groups computed for one series.
pub struct SeriesFrames<'a> {
    pub indicators: &'a IndicatorFrame,
    pub scores: &'a ScoreFrame,
    pub lagged: &'a LaggedFrame,
    pub targets: &'a TargetFrame,
}

/// Собирает строки для записи: одна строка на бар
pub fn assemble(series: &SortedBarSeries, frames: SeriesFrames<'_>, stamp: &RunStamp) -> UpsertBatch<SignalRecord> {
    let has_volume = series.has_volume();
    let records: Vec<SignalRecord> = series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| SignalRecord {
            symbol: bar.symbol.clone(),
            asset_type: bar.asset_type,
            timeframe: bar.timeframe,
            timestamp: bar.timestamp.timestamp(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: has_volume.then_some(bar.volume),
            hour_of_day: bar.timestamp.hour() as u8,
            day_of_week: bar.timestamp.weekday().number_from_monday() as u8,
            indicators: frames.indicators.values_at(i),
            scores: frames.scores.values_at(i),
            lagged: sanitize_lagged(frames.lagged.values_at(i)),
            targets: sanitize_targets(frames.targets.values_at(i)),
            logic_version: stamp.logic_version.clone(),
            computed_at: stamp.computed_at,
        })
        .collect();

    debug_assert!(records.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    debug!(
        "Assembled {} rows for {} ({})",
        records.len(),
        series.symbol(),
        series.timeframe()
    );

    UpsertBatch {
        symbol: series.symbol().to_string(),
        timeframe: series.timeframe(),
        logic_version: stamp.logic_version.clone(),
        records,
    }
}

pub fn assemble_nested(symbol: &str, scores: Vec<NestedScore>, stamp: &RunStamp) -> UpsertBatch<NestedScoreRecord> {
    let records = scores
        .into_iter()
        .map(|score| NestedScoreRecord {
            symbol: symbol.to_string(),
            timestamp: score.timestamp.timestamp(),
            as_of: score.as_of.timestamp(),
            score: sanitize_nested(score),
            logic_version: stamp.logic_version.clone(),
            computed_at: stamp.computed_at,
        })
        .collect();

    UpsertBatch {
        symbol: symbol.to_string(),
        timeframe: Timeframe::Hourly,
        logic_version: stamp.logic_version.clone(),
        records,
    }
}

/// One JSON object per line, the `JSONEachRow` input format.
pub fn to_json_lines<R: Serialize>(records: &[R]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

fn sanitize_lagged(values: LaggedValues) -> LaggedValues {
    LaggedValues {
        close_lag_1: sanitize(values.close_lag_1),
        close_lag_5: sanitize(values.close_lag_5),
        return_1_lag_1: sanitize(values.return_1_lag_1),
        rsi_lag_1: sanitize(values.rsi_lag_1),
        macd_histogram_lag_1: sanitize(values.macd_histogram_lag_1),
        volume_lag_1: sanitize(values.volume_lag_1),
    }
}

fn sanitize_targets(values: TargetValues) -> TargetValues {
    let target_return_1d = sanitize(values.target_return_1d);
    TargetValues {
        target_return_5d: sanitize(values.target_return_5d),
        target_direction_1d: values.target_direction_1d,
        target_signal_1d: target_return_1d.and(values.target_signal_1d),
        target_return_1d,
    }
}

fn sanitize_nested(score: NestedScore) -> NestedScore {
    NestedScore {
        daily_score: sanitize(score.daily_score),
        hourly_score: sanitize(score.hourly_score),
        fivemin_score: sanitize(score.fivemin_score),
        fivemin_ema_pct: sanitize(score.fivemin_ema_pct),
        fivemin_macd_pct: sanitize(score.fivemin_macd_pct),
        fivemin_price_up_pct: sanitize(score.fivemin_price_up_pct),
        enhanced_nested_score: sanitize(score.enhanced_nested_score),
        ..score
    }
}
