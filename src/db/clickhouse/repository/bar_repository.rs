// File: src/db/clickhouse/repository/bar_repository.rs
use super::RepositoryResult;
use crate::db::clickhouse::connection::ClickhouseConnection;
use crate::db::clickhouse::models::bar::DbBarRow;
use crate::types::{RawBar, Timeframe};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

#[async_trait]
pub trait BarRepository: Send + Sync {
    /// Возвращает символы, у которых есть бары хотя бы в одном из таймфреймов
    async fn list_symbols(&self, timeframes: &[Timeframe]) -> RepositoryResult<Vec<String>>;

    /// Возвращает всю историю баров символа в указанном таймфрейме.
    /// `timestamp` хранится как Int64, секунды от эпохи.
    async fn get_bars(&self, symbol: &str, timeframe: Timeframe) -> RepositoryResult<Vec<RawBar>>;
}

pub struct ClickhouseBarRepository {
    connection: Arc<ClickhouseConnection>,
    table: String,
}

impl ClickhouseBarRepository {
    pub fn new(connection: Arc<ClickhouseConnection>, table: impl Into<String>) -> Self {
        Self {
            connection,
            table: table.into(),
        }
    }
}

#[async_trait]
impl BarRepository for ClickhouseBarRepository {
    async fn list_symbols(&self, timeframes: &[Timeframe]) -> RepositoryResult<Vec<String>> {
        let client = self.connection.get_client();
        let names: Vec<&str> = timeframes.iter().map(Timeframe::as_str).collect();

        let query = format!(
            "SELECT DISTINCT symbol FROM {} WHERE has(?, timeframe) ORDER BY symbol",
            self.table
        );

        #[derive(Debug, Deserialize, clickhouse::Row)]
        struct SymbolRow {
            symbol: String,
        }

        debug!("Fetching symbols from {} for timeframes {:?}", self.table, names);

        let rows = client
            .query(&query)
            .bind(names)
            .fetch_all::<SymbolRow>()
            .await?;
        let symbols: Vec<String> = rows.into_iter().map(|row| row.symbol).collect();

        info!("Fetched {} symbols with bars", symbols.len());
        Ok(symbols)
    }

    async fn get_bars(&self, symbol: &str, timeframe: Timeframe) -> RepositoryResult<Vec<RawBar>> {
        let client = self.connection.get_client();

        let query = format!(
            "SELECT
                symbol,
                asset_type,
                timestamp,
                open,
                high,
                low,
                close,
                volume
            FROM {}
            WHERE symbol = ? AND timeframe = ?
            ORDER BY timestamp ASC",
            self.table
        );

        let rows = client
            .query(&query)
            .bind(symbol)
            .bind(timeframe.as_str())
            .fetch_all::<DbBarRow>()
            .await?;

        debug!("Fetched {} {} bars for {}", rows.len(), timeframe, symbol);

        Ok(rows.into_iter().map(RawBar::from).collect())
    }
}
