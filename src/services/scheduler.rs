// File: src/services/scheduler.rs
use crate::app_state::models::AppState;
use crate::services::assembler::RunStamp;
use crate::services::pipeline::SymbolPipeline;
use crate::types::{RawBar, Timeframe};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tokio::time;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Итог одного прогона пересчёта
#[derive(Debug, Clone, PartialEq)]
pub struct RecomputeReport {
    pub run_id: Uuid,
    pub logic_version: String,
    pub symbols_total: usize,
    pub symbols_succeeded: usize,
    pub rows_upserted: u64,
    pub failures: Vec<SymbolFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: String,
}

pub struct RecomputeScheduler {
    app_state: Arc<AppState>,
}

impl RecomputeScheduler {
    pub fn new(app_state: Arc<AppState>) -> Self {
        Self { app_state }
    }

    /// Пересчитывает все символы с новым run_id и текущим временем
    pub async fn trigger_update(&self) -> Result<RecomputeReport, BoxError> {
        let stamp = RunStamp {
            logic_version: self.app_state.settings.app_config.engine.logic_version(),
            computed_at: Utc::now().timestamp(),
        };
        self.run_once(Uuid::new_v4(), stamp).await
    }

    /// Один полный прогон. Каждый символ обрабатывается ровно одной задачей,
    /// число одновременно обрабатываемых символов ограничено семафором.
    pub async fn run_once(&self, run_id: Uuid, stamp: RunStamp) -> Result<RecomputeReport, BoxError> {
        let recompute = &self.app_state.settings.app_config.recompute;
        info!(
            "Starting recompute run {} (logic_version={})",
            run_id, stamp.logic_version
        );

        let symbols = self
            .app_state
            .bar_repository
            .list_symbols(&recompute.timeframes)
            .await?;

        let mut report = RecomputeReport {
            run_id,
            logic_version: stamp.logic_version.clone(),
            symbols_total: symbols.len(),
            symbols_succeeded: 0,
            rows_upserted: 0,
            failures: Vec::new(),
        };

        if symbols.is_empty() {
            info!("No symbols found for processing");
            return Ok(report);
        }

        info!(
            "Found {} symbols, processing with up to {} in parallel",
            symbols.len(),
            recompute.max_parallel_symbols
        );

        let semaphore = Arc::new(Semaphore::new(recompute.max_parallel_symbols));
        let stamp = Arc::new(stamp);
        let mut tasks = JoinSet::new();
        // Символ по id задачи: паника задачи не возвращает её результат
        let mut task_symbols: HashMap<task::Id, String> = HashMap::with_capacity(symbols.len());

        for symbol in symbols {
            let app_state = self.app_state.clone();
            let semaphore = semaphore.clone();
            let stamp = stamp.clone();
            let span = info_span!("symbol", symbol = %symbol, run_id = %run_id);

            let task_symbol = symbol.clone();
            let handle = tasks.spawn(
                async move {
                    let result = match semaphore.acquire_owned().await {
                        Ok(_permit) => process_symbol(app_state, &symbol, stamp).await,
                        Err(e) => Err(Box::new(e) as BoxError),
                    };
                    (symbol, result)
                }
                .instrument(span),
            );
            task_symbols.insert(handle.id(), task_symbol);
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((symbol, Ok(rows))) => {
                    report.symbols_succeeded += 1;
                    report.rows_upserted += rows;
                    debug!("Symbol {} done: {} rows", symbol, rows);
                }
                Ok((symbol, Err(e))) => {
                    error!("Error processing symbol {}: {}", symbol, e);
                    report.failures.push(SymbolFailure {
                        symbol,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    let symbol = task_symbols
                        .remove(&e.id())
                        .unwrap_or_else(|| String::from("<unknown>"));
                    error!("Symbol task for {} aborted: {}", symbol, e);
                    report.failures.push(SymbolFailure {
                        symbol,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        info!(
            "Completed recompute run {}: {}/{} symbols, {} rows upserted, {} failures",
            run_id,
            report.symbols_succeeded,
            report.symbols_total,
            report.rows_upserted,
            report.failures.len()
        );

        Ok(report)
    }

    /// Запускает планировщик для регулярного пересчёта
    pub async fn start(&self) {
        let recompute = &self.app_state.settings.app_config.recompute;
        if !recompute.enabled {
            info!("Recompute scheduler is disabled in configuration");
            return;
        }

        // Вывод информации об окне работы, если оно настроено
        if let (Some(start), Some(end)) = (&recompute.start_time, &recompute.end_time) {
            info!("Scheduler operation window configured: {} to {} UTC", start, end);
        }

        info!(
            "Starting recompute scheduler with {} second interval",
            recompute.interval_seconds
        );

        let app_state = self.app_state.clone();
        let mut interval = time::interval(Duration::from_secs(recompute.interval_seconds));
        // Первый тик срабатывает сразу, а начальный прогон уже выполнен
        interval.tick().await;

        tokio::spawn(async move {
            loop {
                interval.tick().await;

                if !app_state.settings.app_config.recompute.is_operation_allowed() {
                    debug!(
                        "Scheduler: skipping update - outside operation window (current time: {})",
                        Utc::now().format("%H:%M:%S")
                    );
                    continue;
                }

                info!("Scheduler: triggering recompute");
                let scheduler = RecomputeScheduler::new(app_state.clone());
                match scheduler.trigger_update().await {
                    Ok(report) if report.failures.is_empty() => info!(
                        "Scheduler: recomputed {} symbols",
                        report.symbols_succeeded
                    ),
                    Ok(report) => warn!(
                        "Scheduler: recomputed {} symbols, {} failed",
                        report.symbols_succeeded,
                        report.failures.len()
                    ),
                    Err(e) => error!("Scheduler: recompute failed: {}", e),
                }
            }
        });
    }
}

/// Загружает бары символа, считает их вне async-рантайма и записывает результат
async fn process_symbol(app_state: Arc<AppState>, symbol: &str, stamp: Arc<RunStamp>) -> Result<u64, BoxError> {
    let recompute = &app_state.settings.app_config.recompute;

    let mut raw: Vec<(Timeframe, Vec<RawBar>)> = Vec::with_capacity(recompute.timeframes.len());
    for timeframe in &recompute.timeframes {
        let bars = app_state.bar_repository.get_bars(symbol, *timeframe).await?;
        raw.push((*timeframe, bars));
    }

    let settings = app_state.settings.clone();
    let owned_symbol = symbol.to_string();
    let nested_enabled = recompute.nested_enabled;
    let output = tokio::task::spawn_blocking(move || {
        SymbolPipeline::new(&settings.app_config.engine, &stamp).run_symbol(
            &owned_symbol,
            &raw,
            nested_enabled,
        )
    })
    .await??;

    let mut rows = 0;
    for batch in &output.signals {
        rows += app_state.signal_repository.upsert_signals(batch).await?;
    }
    if let Some(nested) = &output.nested {
        rows += app_state.signal_repository.upsert_nested(nested).await?;
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::clickhouse::repository::RepositoryResult;
    use crate::db::clickhouse::repository::bar_repository::BarRepository;
    use crate::db::clickhouse::repository::signal_repository::SignalRepository;
    use crate::env_config::models::app_config::AppConfig;
    use crate::env_config::models::app_env::{AppEnv, Env};
    use crate::env_config::models::app_setting::AppSettings;
    use crate::services::assembler::{NestedScoreRecord, SignalRecord, UpsertBatch, to_json_lines};
    use crate::services::normalizer::test_support::{START, raw_bar};
    use crate::types::RawNumber;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MemoryBars {
        bars: HashMap<(String, Timeframe), Vec<RawBar>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl BarRepository for MemoryBars {
        async fn list_symbols(&self, timeframes: &[Timeframe]) -> RepositoryResult<Vec<String>> {
            let mut symbols: Vec<String> = self
                .bars
                .keys()
                .filter(|(_, tf)| timeframes.contains(tf))
                .map(|(symbol, _)| symbol.clone())
                .collect();
            symbols.sort();
            symbols.dedup();
            Ok(symbols)
        }

        async fn get_bars(&self, symbol: &str, timeframe: Timeframe) -> RepositoryResult<Vec<RawBar>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(self
                .bars
                .get(&(symbol.to_string(), timeframe))
                .cloned()
                .unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct MemorySignals {
        signals: Mutex<Vec<UpsertBatch<SignalRecord>>>,
        nested: Mutex<Vec<UpsertBatch<NestedScoreRecord>>>,
    }

    #[async_trait]
    impl SignalRepository for MemorySignals {
        async fn upsert_signals(&self, batch: &UpsertBatch<SignalRecord>) -> RepositoryResult<u64> {
            self.signals.lock().unwrap().push(batch.clone());
            Ok(batch.len() as u64)
        }

        async fn upsert_nested(&self, batch: &UpsertBatch<NestedScoreRecord>) -> RepositoryResult<u64> {
            self.nested.lock().unwrap().push(batch.clone());
            Ok(batch.len() as u64)
        }
    }

    fn settings(max_parallel_symbols: usize, timeframes: Vec<Timeframe>) -> Arc<AppSettings> {
        let mut app_config = AppConfig::from_toml(include_str!("../../config/local.toml")).unwrap();
        app_config.recompute.max_parallel_symbols = max_parallel_symbols;
        app_config.recompute.timeframes = timeframes;
        Arc::new(AppSettings {
            app_config,
            app_env: AppEnv {
                env: Env::Local,
                clickhouse_url: String::new(),
                clickhouse_user: String::new(),
                clickhouse_password: String::new(),
                clickhouse_database: String::new(),
            },
        })
    }

    fn daily_bars(symbol: &str, count: usize) -> Vec<RawBar> {
        (0..count)
            .map(|i| raw_bar(symbol, START + i as i64 * 86_400, 50.0 + (i as f64 * 0.4).cos(), Some(100.0)))
            .collect()
    }

    fn stamp() -> RunStamp {
        RunStamp {
            logic_version: "test".to_string(),
            computed_at: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_failing_symbol_is_isolated() {
        let mut bars = MemoryBars::default();
        bars.bars.insert(("AAA".into(), Timeframe::Daily), daily_bars("AAA", 40));
        bars.bars.insert(("CCC".into(), Timeframe::Daily), daily_bars("CCC", 40));
        let mut broken = daily_bars("BBB", 40);
        broken[7].high = RawNumber::Text("oops".into());
        bars.bars.insert(("BBB".into(), Timeframe::Daily), broken);

        let signals = Arc::new(MemorySignals::default());
        let state = Arc::new(AppState::new(
            settings(2, vec![Timeframe::Daily]),
            Arc::new(bars),
            signals.clone(),
        ));

        let report = RecomputeScheduler::new(state).run_once(Uuid::new_v4(), stamp()).await.unwrap();
        assert_eq!(report.symbols_total, 3);
        assert_eq!(report.symbols_succeeded, 2);
        assert_eq!(report.rows_upserted, 80);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].symbol, "BBB");
        assert!(report.failures[0].error.contains("high"));

        let stored = signals.signals.lock().unwrap();
        let mut symbols: Vec<&str> = stored.iter().map(|b| b.symbol.as_str()).collect();
        symbols.sort();
        assert_eq!(symbols, vec!["AAA", "CCC"]);
    }

    /// Bars source that panics while loading one symbol.
    struct PanickingBars {
        inner: MemoryBars,
        poisoned: &'static str,
    }

    #[async_trait]
    impl BarRepository for PanickingBars {
        async fn list_symbols(&self, timeframes: &[Timeframe]) -> RepositoryResult<Vec<String>> {
            self.inner.list_symbols(timeframes).await
        }

        async fn get_bars(&self, symbol: &str, timeframe: Timeframe) -> RepositoryResult<Vec<RawBar>> {
            if symbol == self.poisoned {
                panic!("bars source crashed on {symbol}");
            }
            self.inner.get_bars(symbol, timeframe).await
        }
    }

    #[tokio::test]
    async fn test_panicking_task_reports_its_symbol() {
        let mut inner = MemoryBars::default();
        inner.bars.insert(("AAA".into(), Timeframe::Daily), daily_bars("AAA", 10));
        inner.bars.insert(("ZZZ".into(), Timeframe::Daily), daily_bars("ZZZ", 10));
        let bars = PanickingBars { inner, poisoned: "ZZZ" };

        let state = Arc::new(AppState::new(
            settings(2, vec![Timeframe::Daily]),
            Arc::new(bars),
            Arc::new(MemorySignals::default()),
        ));
        let report = RecomputeScheduler::new(state).run_once(Uuid::new_v4(), stamp()).await.unwrap();

        assert_eq!(report.symbols_succeeded, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].symbol, "ZZZ");
        assert!(report.failures[0].error.contains("panic"));
    }

    #[tokio::test]
    async fn test_parallelism_is_bounded() {
        let mut bars = MemoryBars::default();
        for i in 0..8 {
            let symbol = format!("S{i}");
            bars.bars.insert((symbol.clone(), Timeframe::Daily), daily_bars(&symbol, 5));
        }
        let bars = Arc::new(bars);
        let state = Arc::new(AppState::new(
            settings(2, vec![Timeframe::Daily]),
            bars.clone(),
            Arc::new(MemorySignals::default()),
        ));

        let report = RecomputeScheduler::new(state).run_once(Uuid::new_v4(), stamp()).await.unwrap();
        assert_eq!(report.symbols_succeeded, 8);
        assert!(bars.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_repeated_runs_write_identical_rows() {
        let make_state = |signals: Arc<MemorySignals>| {
            let mut bars = MemoryBars::default();
            bars.bars.insert(("AAA".into(), Timeframe::Daily), daily_bars("AAA", 60));
            Arc::new(AppState::new(settings(4, vec![Timeframe::Daily]), Arc::new(bars), signals))
        };
        let first = Arc::new(MemorySignals::default());
        let second = Arc::new(MemorySignals::default());
        let run_a = RecomputeScheduler::new(make_state(first.clone()));
        let run_b = RecomputeScheduler::new(make_state(second.clone()));

        let reports = futures::future::join_all([
            run_a.run_once(Uuid::new_v4(), stamp()),
            run_b.run_once(Uuid::new_v4(), stamp()),
        ])
        .await;
        assert!(reports.iter().all(|r| r.is_ok()));

        let lines = |sink: &MemorySignals| {
            let stored = sink.signals.lock().unwrap();
            to_json_lines(&stored[0].records).unwrap()
        };
        assert_eq!(lines(&first), lines(&second));
    }

    #[tokio::test]
    async fn test_nested_scores_written_when_all_timeframes_present() {
        let mut bars = MemoryBars::default();
        let series = |step: i64, count: usize| -> Vec<RawBar> {
            (0..count)
                .map(|i| raw_bar("BTC", START + i as i64 * step, 100.0 + (i as f64 * 0.2).sin(), Some(1.0)))
                .collect()
        };
        bars.bars.insert(("BTC".into(), Timeframe::Daily), series(86_400, 5));
        bars.bars.insert(("BTC".into(), Timeframe::Hourly), series(3_600, 120));
        bars.bars.insert(("BTC".into(), Timeframe::FiveMinute), series(300, 1_440));

        let signals = Arc::new(MemorySignals::default());
        let state = Arc::new(AppState::new(
            settings(1, Timeframe::ALL.to_vec()),
            Arc::new(bars),
            signals.clone(),
        ));
        let report = RecomputeScheduler::new(state).run_once(Uuid::new_v4(), stamp()).await.unwrap();
        assert!(report.failures.is_empty());
        assert_eq!(report.rows_upserted, 5 + 120 + 1_440 + 120);
        assert_eq!(signals.signals.lock().unwrap().len(), 3);
        let nested = signals.nested.lock().unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].records.len(), 120);
        assert_eq!(nested[0].records[0].logic_version, "test");
    }
}
