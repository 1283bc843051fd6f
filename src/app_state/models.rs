// File: src/app_state/models.rs
use crate::db::clickhouse::repository::bar_repository::BarRepository;
use crate::db::clickhouse::repository::signal_repository::SignalRepository;
use crate::env_config::models::app_setting::AppSettings;

use std::sync::Arc;

pub struct AppState {
    pub settings: Arc<AppSettings>,
    pub bar_repository: Arc<dyn BarRepository>,
    pub signal_repository: Arc<dyn SignalRepository>,
}

impl AppState {
    pub fn new(
        settings: Arc<AppSettings>,
        bar_repository: Arc<dyn BarRepository>,
        signal_repository: Arc<dyn SignalRepository>,
    ) -> Self {
        Self {
            settings,
            bar_repository,
            signal_repository,
        }
    }
}
