// File: src/services/normalizer.rs
use crate::error::EngineError;
use crate::types::{AssetType, Bar, RawBar, RawNumber, SortedBarSeries, Timeframe};
use tracing::{debug, warn};

/// Приводит сырые записи одного символа к строго упорядоченной серии баров.
///
/// Ошибка в OHLC или метке времени любой строки отклоняет весь символ.
/// Дубликаты по времени отбрасываются (остаётся первая запись во входном
/// порядке), отсутствующий объём заменяется нулём.
pub fn normalize(
    symbol: &str,
    timeframe: Timeframe,
    raw: &[RawBar],
) -> Result<SortedBarSeries, EngineError> {
    let first = raw
        .first()
        .ok_or_else(|| EngineError::EmptySeries(symbol.to_string()))?;
    let asset_type: AssetType = first.asset_type.parse()?;

    let mut bars = Vec::with_capacity(raw.len());
    let mut volume_seen = false;
    let mut bad_volume = 0usize;

    for (index, record) in raw.iter().enumerate() {
        if record.symbol != symbol {
            return Err(EngineError::MixedSymbols {
                expected: symbol.to_string(),
                found: record.symbol.clone(),
            });
        }

        let timestamp =
            record
                .timestamp
                .to_datetime()
                .ok_or_else(|| EngineError::InvalidTimestamp {
                    symbol: symbol.to_string(),
                    index,
                    value: record.timestamp.describe(),
                })?;

        let field = |name: &'static str, value: &RawNumber| {
            value.as_f64().ok_or_else(|| EngineError::MalformedOhlc {
                symbol: symbol.to_string(),
                index,
                field: name,
                value: value.describe(),
            })
        };
        let open = field("open", &record.open)?;
        let high = field("high", &record.high)?;
        let low = field("low", &record.low)?;
        let close = field("close", &record.close)?;

        // Объём: отсутствующий или нечитаемый считается нулевым
        let volume = match &record.volume {
            Some(value) => match value.as_f64() {
                Some(v) => {
                    volume_seen = true;
                    v.max(0.0)
                }
                None => {
                    bad_volume += 1;
                    0.0
                }
            },
            None => 0.0,
        };

        bars.push(Bar {
            symbol: symbol.to_string(),
            asset_type,
            timeframe,
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    if bad_volume > 0 {
        warn!(
            "{} unparseable volume values coerced to 0 for symbol {}",
            bad_volume, symbol
        );
    }

    // Стабильная сортировка сохраняет входной порядок среди одинаковых меток
    bars.sort_by_key(|bar| bar.timestamp);
    let before = bars.len();
    bars.dedup_by_key(|bar| bar.timestamp);
    let dropped = before - bars.len();
    if dropped > 0 {
        warn!(
            "Dropped {} duplicate bars for symbol {} ({}), kept first occurrence",
            dropped, symbol, timeframe
        );
    }

    let has_volume = asset_type.has_volume() && volume_seen;
    debug!(
        "Normalized {} bars for symbol {} ({}, asset_type={}, has_volume={})",
        bars.len(),
        symbol,
        timeframe,
        asset_type,
        has_volume
    );

    Ok(SortedBarSeries::new(
        symbol.to_string(),
        asset_type,
        timeframe,
        has_volume,
        bars,
    ))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::types::RawTimestamp;

    const DAY: i64 = 86_400;
    pub const START: i64 = 1_704_067_200; // 2024-01-01T00:00:00Z

    pub fn raw_bar(symbol: &str, ts: i64, close: f64, volume: Option<f64>) -> RawBar {
        RawBar {
            symbol: symbol.to_string(),
            asset_type: "stock".to_string(),
            timestamp: RawTimestamp::Epoch(ts),
            open: RawNumber::Number(close),
            high: RawNumber::Number(close + 1.0),
            low: RawNumber::Number(close - 1.0),
            close: RawNumber::Number(close),
            volume: volume.map(RawNumber::Number),
        }
    }

    /// Daily stock series with the given closes, high/low at close ± 1.
    pub fn series_from_closes(closes: &[f64]) -> SortedBarSeries {
        let raw: Vec<RawBar> = closes
            .iter()
            .enumerate()
            .map(|(i, c)| raw_bar("TEST", START + i as i64 * DAY, *c, Some(1_000.0 + i as f64)))
            .collect();
        normalize("TEST", Timeframe::Daily, &raw).unwrap()
    }

    /// Daily series from explicit (open, high, low, close, volume) tuples.
    pub fn series_from_ohlcv(rows: &[(f64, f64, f64, f64, f64)]) -> SortedBarSeries {
        let raw: Vec<RawBar> = rows
            .iter()
            .enumerate()
            .map(|(i, (o, h, l, c, v))| RawBar {
                symbol: "TEST".to_string(),
                asset_type: "crypto".to_string(),
                timestamp: RawTimestamp::Epoch(START + i as i64 * DAY),
                open: RawNumber::Number(*o),
                high: RawNumber::Number(*h),
                low: RawNumber::Number(*l),
                close: RawNumber::Number(*c),
                volume: Some(RawNumber::Number(*v)),
            })
            .collect();
        normalize("TEST", Timeframe::Daily, &raw).unwrap()
    }

    /// Smooth oscillating uptrend, long enough for every warm-up.
    pub fn wave_series(len: usize) -> SortedBarSeries {
        let closes: Vec<f64> = (0..len)
            .map(|i| 100.0 + i as f64 * 0.3 + (i as f64 * 0.45).sin() * 4.0)
            .collect();
        series_from_closes(&closes)
    }
}
