use super::models::{app_config::AppConfig, app_env::Env};
use crate::error::EngineError;
use std::fs;
use std::path::Path;

impl AppConfig {
    /// Loads `config/{env}.toml` and validates the engine section.
    pub fn new(env: &Env) -> Result<AppConfig, EngineError> {
        Self::from_file(format!("config/{}.toml", env))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<AppConfig, EngineError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            EngineError::invalid_config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<AppConfig, EngineError> {
        let config: AppConfig = toml::from_str(raw)
            .map_err(|e| EngineError::invalid_config(format!("cannot parse config: {}", e)))?;
        config.engine.validate()?;
        if config.recompute.max_parallel_symbols == 0 {
            return Err(EngineError::invalid_config(
                "recompute.max_parallel_symbols must be > 0",
            ));
        }
        Ok(config)
    }
}
