// File: src/db/clickhouse/repository/signal_repository.rs
use super::RepositoryResult;
use crate::db::clickhouse::connection::ClickhouseConnection;
use crate::env_config::models::app_config::ClickhouseConfig;
use crate::services::assembler::{NestedScoreRecord, SignalRecord, UpsertBatch, to_json_lines};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Sink for assembled rows. Tables are `ReplacingMergeTree` ordered by
/// `(symbol, timestamp)`, so re-inserting a key replaces the old row.
#[async_trait]
pub trait SignalRepository: Send + Sync {
    async fn upsert_signals(&self, batch: &UpsertBatch<SignalRecord>) -> RepositoryResult<u64>;

    async fn upsert_nested(&self, batch: &UpsertBatch<NestedScoreRecord>) -> RepositoryResult<u64>;
}

pub struct ClickhouseSignalRepository {
    connection: Arc<ClickhouseConnection>,
    tables: ClickhouseConfig,
}

impl ClickhouseSignalRepository {
    pub fn new(connection: Arc<ClickhouseConnection>, tables: ClickhouseConfig) -> Self {
        Self { connection, tables }
    }

    async fn insert_rows<R: Serialize + Sync>(&self, table: &str, records: &[R]) -> RepositoryResult<u64> {
        if records.is_empty() {
            debug!("No rows to insert into {}", table);
            return Ok(0);
        }

        let client = self.connection.get_client();
        let batch_size = self.tables.insert_batch_size.max(1);
        let total_count = records.len();
        let mut successful_inserts = 0u64;

        // Вставка пакетами по insert_batch_size строк
        for chunk in records.chunks(batch_size) {
            let sql = insert_statement(table, &to_json_lines(chunk)?);

            match client.query(&sql).execute().await {
                Ok(_) => {
                    successful_inserts += chunk.len() as u64;
                    debug!(
                        "Inserted batch of {} rows into {} ({}/{})",
                        chunk.len(),
                        table,
                        successful_inserts,
                        total_count
                    );
                }
                Err(e) => {
                    error!("Batch insertion into {} failed: {}", table, e);
                    return Err(Box::new(e));
                }
            }
        }

        Ok(successful_inserts)
    }
}

#[async_trait]
impl SignalRepository for ClickhouseSignalRepository {
    async fn upsert_signals(&self, batch: &UpsertBatch<SignalRecord>) -> RepositoryResult<u64> {
        let table = self.tables.signals_table(batch.timeframe).to_string();
        let inserted = self.insert_rows(&table, &batch.records).await?;
        info!(
            "Upserted {} {} rows for {} (logic_version={})",
            inserted, batch.timeframe, batch.symbol, batch.logic_version
        );
        Ok(inserted)
    }

    async fn upsert_nested(&self, batch: &UpsertBatch<NestedScoreRecord>) -> RepositoryResult<u64> {
        let table = self.tables.nested_table.clone();
        let inserted = self.insert_rows(&table, &batch.records).await?;
        info!("Upserted {} nested score rows for {}", inserted, batch.symbol);
        Ok(inserted)
    }
}

/// `INSERT ... FORMAT JSONEachRow` with the rows inlined. A literal `?`
/// is doubled so the query builder does not read it as a bind marker.
fn insert_statement(table: &str, json_lines: &str) -> String {
    format!(
        "INSERT INTO {} FORMAT JSONEachRow\n{}",
        table,
        json_lines.replace('?', "??")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_statement() {
        let sql = insert_statement("market_data.signals_daily", "{\"symbol\":\"A?B\"}\n");
        assert!(sql.starts_with("INSERT INTO market_data.signals_daily FORMAT JSONEachRow\n"));
        assert!(sql.ends_with("{\"symbol\":\"A??B\"}\n"));
    }
}
