// File: src/db/clickhouse/clickhouse_service.rs
use crate::db::clickhouse::connection::ClickhouseConnection;
use crate::db::clickhouse::repository::bar_repository::ClickhouseBarRepository;
use crate::db::clickhouse::repository::signal_repository::ClickhouseSignalRepository;
use crate::env_config::models::app_setting::AppSettings;
use std::sync::Arc;
use tracing::{error, info};

pub struct ClickhouseService {
    // Соединения
    pub connection: Arc<ClickhouseConnection>,
    // Источник баров и приёмник рассчитанных строк
    pub repository_bar: Arc<ClickhouseBarRepository>,
    pub repository_signal: Arc<ClickhouseSignalRepository>,
}

impl ClickhouseService {
    pub async fn new(settings: &Arc<AppSettings>) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        info!("Initializing database service components");

        // Инициализация соединения с ClickHouse
        info!("Creating ClickHouse connection");
        let clickhouse_connection = match ClickhouseConnection::new(settings.clone()).await {
            Ok(conn) => {
                info!("ClickHouse connection established successfully");
                Arc::new(conn)
            }
            Err(e) => {
                error!("Failed to establish ClickHouse connection: {}", e);
                return Err(Box::new(e));
            }
        };

        info!("Initialize repositories (ClickHouse)");
        let tables = &settings.app_config.clickhouse;

        let bar_repository = Arc::new(ClickhouseBarRepository::new(
            clickhouse_connection.clone(),
            tables.bars_table.clone(),
        ));
        let signal_repository = Arc::new(ClickhouseSignalRepository::new(
            clickhouse_connection.clone(),
            tables.clone(),
        ));

        info!("Database service initialized successfully");

        Ok(Self {
            connection: clickhouse_connection,
            repository_bar: bar_repository,
            repository_signal: signal_repository,
        })
    }
}
