use super::engine_config::EngineConfig;
use crate::types::Timeframe;
use chrono::NaiveTime;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub log: LogConfig,
    pub clickhouse: ClickhouseConfig,
    pub recompute: RecomputeConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize)]
pub struct RecomputeConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub max_parallel_symbols: usize,
    pub timeframes: Vec<Timeframe>,
    /// Compute nested multi-timeframe scores when all three timeframes are loaded
    #[serde(default = "default_true")]
    pub nested_enabled: bool,
    #[serde(default)]
    pub start_time: Option<String>, // Время начала в UTC, формат: "HH:MM:SS"
    #[serde(default)]
    pub end_time: Option<String>, // Время окончания в UTC, формат: "HH:MM:SS"
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClickhouseConfig {
    pub timeout: u64,
    pub bars_table: String,
    pub signals_table_daily: String,
    pub signals_table_hourly: String,
    pub signals_table_five_minute: String,
    pub nested_table: String,
    pub insert_batch_size: usize,
}

fn default_true() -> bool {
    true
}

impl ClickhouseConfig {
    pub fn signals_table(&self, timeframe: Timeframe) -> &str {
        match timeframe {
            Timeframe::Daily => &self.signals_table_daily,
            Timeframe::Hourly => &self.signals_table_hourly,
            Timeframe::FiveMinute => &self.signals_table_five_minute,
        }
    }
}

impl RecomputeConfig {
    /// Checks if the current time is within the allowed operation window
    pub fn is_operation_allowed(&self) -> bool {
        self.is_operation_allowed_at(chrono::Utc::now().time())
    }

    pub fn is_operation_allowed_at(&self, now: NaiveTime) -> bool {
        // If no time window is configured, always allow operation
        let (Some(start_str), Some(end_str)) = (&self.start_time, &self.end_time) else {
            return true;
        };

        if let (Ok(start), Ok(end)) = (
            NaiveTime::parse_from_str(start_str, "%H:%M:%S"),
            NaiveTime::parse_from_str(end_str, "%H:%M:%S"),
        ) {
            if start <= end {
                // Simple case: start time is before end time
                return start <= now && now <= end;
            } else {
                // Case where operation window crosses midnight
                // e.g., start=21:00:00, end=04:00:00
                return start <= now || now <= end;
            }
        }

        // If parsing fails, default to allowing operation
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recompute(start: Option<&str>, end: Option<&str>) -> RecomputeConfig {
        RecomputeConfig {
            enabled: true,
            interval_seconds: 60,
            max_parallel_symbols: 4,
            timeframes: vec![Timeframe::Daily],
            nested_enabled: false,
            start_time: start.map(String::from),
            end_time: end.map(String::from),
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_operation_window_unset_always_allows() {
        assert!(recompute(None, None).is_operation_allowed_at(at(3, 0)));
        assert!(recompute(Some("10:00:00"), None).is_operation_allowed_at(at(3, 0)));
    }

    #[test]
    fn test_operation_window_same_day() {
        let cfg = recompute(Some("09:00:00"), Some("17:00:00"));
        assert!(cfg.is_operation_allowed_at(at(12, 0)));
        assert!(!cfg.is_operation_allowed_at(at(18, 0)));
    }

    #[test]
    fn test_operation_window_crossing_midnight() {
        let cfg = recompute(Some("21:00:00"), Some("04:00:00"));
        assert!(cfg.is_operation_allowed_at(at(23, 30)));
        assert!(cfg.is_operation_allowed_at(at(2, 0)));
        assert!(!cfg.is_operation_allowed_at(at(12, 0)));
    }

    #[test]
    fn test_bundled_config_files_parse() {
        for raw in [
            include_str!("../../../config/local.toml"),
            include_str!("../../../config/dev.toml"),
            include_str!("../../../config/prod.toml"),
        ] {
            let config: AppConfig = toml::from_str(raw).unwrap();
            assert!(config.engine.validate().is_ok());
            assert!(!config.recompute.timeframes.is_empty());
        }
    }
}
