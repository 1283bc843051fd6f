use thiserror::Error;

/// Ошибки движка расчёта индикаторов.
///
/// Ошибка всегда относится к одному символу: остальные символы
/// в том же прогоне продолжают обрабатываться.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("empty bar series for symbol {0}")]
    EmptySeries(String),

    #[error("bar series mixes symbols: expected {expected}, found {found}")]
    MixedSymbols { expected: String, found: String },

    #[error("malformed {field} for {symbol} at row {index}: {value:?}")]
    MalformedOhlc {
        symbol: String,
        index: usize,
        field: &'static str,
        value: String,
    },

    #[error("invalid timestamp for {symbol} at row {index}: {value:?}")]
    InvalidTimestamp {
        symbol: String,
        index: usize,
        value: String,
    },

    #[error("indicator frame for {symbol} {timeframe} has {frame_len} rows, series has {series_len}")]
    FrameLengthMismatch {
        symbol: String,
        timeframe: String,
        series_len: usize,
        frame_len: usize,
    },

    #[error("unknown asset type {0:?}")]
    UnknownAssetType(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("storage error: {0}")]
    Storage(#[from] clickhouse::error::Error),
}

impl EngineError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        EngineError::InvalidConfig(msg.into())
    }
}
