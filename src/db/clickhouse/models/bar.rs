// File: src/db/clickhouse/models/bar.rs
use crate::types::{RawBar, RawNumber, RawTimestamp};
use clickhouse::Row;
use serde::{Deserialize, Serialize};

/// Строка таблицы баров, как её отдаёт ClickHouse
#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct DbBarRow {
    pub symbol: String,
    pub asset_type: String,
    // Время открытия бара, секунды от эпохи
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    // NULL для форекса и индексов
    pub volume: Option<f64>,
}

impl From<DbBarRow> for RawBar {
    fn from(row: DbBarRow) -> Self {
        Self {
            symbol: row.symbol,
            asset_type: row.asset_type,
            timestamp: RawTimestamp::Epoch(row.timestamp),
            open: RawNumber::Number(row.open),
            high: RawNumber::Number(row.high),
            low: RawNumber::Number(row.low),
            close: RawNumber::Number(row.close),
            volume: row.volume.map(RawNumber::Number),
        }
    }
}
