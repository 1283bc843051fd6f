use super::{AssetType, Timeframe};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Числовое поле сырого бара: число или строка с числом.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

impl RawNumber {
    /// Returns the value only when it is a finite float.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawNumber::Number(v) => *v,
            RawNumber::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    pub fn describe(&self) -> String {
        match self {
            RawNumber::Number(v) => v.to_string(),
            RawNumber::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        RawNumber::Number(value)
    }
}

/// Метка времени сырого бара: epoch-секунды или строка.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Epoch(i64),
    Text(String),
}

impl RawTimestamp {
    /// Accepts epoch seconds, RFC 3339, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD`.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Epoch(secs) => Utc.timestamp_opt(*secs, 0).single(),
            RawTimestamp::Text(s) => {
                let s = s.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return Some(dt.with_timezone(&Utc));
                }
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                    return Some(naive.and_utc());
                }
                if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
                }
                s.parse::<i64>()
                    .ok()
                    .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            RawTimestamp::Epoch(secs) => secs.to_string(),
            RawTimestamp::Text(s) => s.clone(),
        }
    }
}

impl From<i64> for RawTimestamp {
    fn from(secs: i64) -> Self {
        RawTimestamp::Epoch(secs)
    }
}

/// Сырая запись от сборщика данных: возможно неотсортирована,
/// числа могут приходить строками, объёма может не быть.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub symbol: String,
    pub asset_type: String,
    pub timestamp: RawTimestamp,
    pub open: RawNumber,
    pub high: RawNumber,
    pub low: RawNumber,
    pub close: RawNumber,
    #[serde(default)]
    pub volume: Option<RawNumber>,
}

/// Нормализованный бар.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub symbol: String,
    pub asset_type: AssetType,
    pub timeframe: Timeframe,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    pub fn close_time(&self) -> DateTime<Utc> {
        self.timestamp + self.timeframe.duration()
    }
}

/// Time-ordered bars of one symbol and one timeframe.
///
/// Only the normalizer builds this type, so every holder may rely on
/// strictly increasing timestamps and finite OHLC values.
#[derive(Debug, Clone)]
pub struct SortedBarSeries {
    symbol: String,
    asset_type: AssetType,
    timeframe: Timeframe,
    has_volume: bool,
    bars: Vec<Bar>,
}

impl SortedBarSeries {
    pub(crate) fn new(
        symbol: String,
        asset_type: AssetType,
        timeframe: Timeframe,
        has_volume: bool,
        bars: Vec<Bar>,
    ) -> Self {
        debug_assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        Self {
            symbol,
            asset_type,
            timeframe,
            has_volume,
            bars,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Volume-dependent indicators are computed only when this is true.
    pub fn has_volume(&self) -> bool {
        self.has_volume
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// `None` for volumeless assets.
    pub fn volumes(&self) -> Option<Vec<f64>> {
        self.has_volume
            .then(|| self.bars.iter().map(|b| b.volume).collect())
    }

    pub fn close_times(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(Bar::close_time).collect()
    }
}
