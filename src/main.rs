use signal_engine::app_state::models::AppState;
use signal_engine::db::clickhouse::clickhouse_service::ClickhouseService;
use signal_engine::env_config::models::{app_config::AppConfig, app_env::AppEnv, app_setting::AppSettings};
use signal_engine::logger;
use signal_engine::services::scheduler::RecomputeScheduler;
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    // Инициализация приложения
    let settings: Arc<AppSettings> = Arc::new(initialize_application());

    // Подключение к базе данных
    let clickhouse_service = initialize_database_connection(&settings).await;

    // Создание глобального состояния приложения
    let app_state: Arc<AppState> = Arc::new(AppState::new(
        settings.clone(),
        clickhouse_service.repository_bar.clone(),
        clickhouse_service.repository_signal.clone(),
    ));

    // Инициализация и запуск фоновых сервисов
    initialize_background_services(app_state).await;

    info!("Application started successfully, press Ctrl+C to stop");
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, stopping"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }
}

/// Инициализирует настройки и логирование приложения
fn initialize_application() -> AppSettings {
    // Загрузка переменных окружения и конфигурации
    let environment = AppEnv::new();
    let config = AppConfig::new(&environment.env).expect("Failed to load configuration");
    let app_settings = AppSettings {
        app_config: config,
        app_env: environment,
    };

    // Настройка логирования с уровнем и форматом из конфигурации
    logger::init_logger(
        &app_settings.app_config.log.level,
        &app_settings.app_config.log.format,
        !app_settings.app_env.is_local(),
    )
    .expect("Failed to initialize logger");

    info!("Starting Signal Engine application...");
    info!("Current environment: {}", app_settings.app_env.env);
    info!(
        "Engine logic version: {}",
        app_settings.app_config.engine.logic_version()
    );

    // Добавление подробного логирования в режиме разработки
    if app_settings.app_env.is_local() {
        info!("Running in local development mode");
        debug!("Configuration details: {:#?}", app_settings);
    } else {
        info!("Running in production mode");
    }

    app_settings
}

/// Устанавливает соединение с ClickHouse
async fn initialize_database_connection(settings: &Arc<AppSettings>) -> ClickhouseService {
    info!("Initializing database connection...");

    match ClickhouseService::new(settings).await {
        Ok(service) => {
            info!("ClickHouse connection established successfully");
            service
        }
        Err(err) => {
            error!("Failed to connect to ClickHouse: {}", err);
            panic!("Cannot continue without ClickHouse connection");
        }
    }
}

/// Выполняет начальный пересчёт и запускает планировщик
async fn initialize_background_services(app_state: Arc<AppState>) {
    let scheduler = RecomputeScheduler::new(app_state);

    // Выполнение начального пересчёта
    match scheduler.trigger_update().await {
        Ok(report) if report.failures.is_empty() => info!(
            "Initial recompute completed: {} symbols, {} rows",
            report.symbols_succeeded, report.rows_upserted
        ),
        Ok(report) => warn!(
            "Initial recompute completed with {} failed symbols out of {}",
            report.failures.len(),
            report.symbols_total
        ),
        Err(err) => error!("Failed to perform initial recompute: {}", err),
    }

    // Запуск планировщика для регулярных обновлений
    scheduler.start().await;

    info!("Background services initialized successfully");
}
