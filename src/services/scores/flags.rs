// File: src/services/scores/flags.rs
use crate::env_config::models::engine_config::FlagConfig;

/// Определяет зону RSI: -1 перекупленность, 1 перепроданность, 0 нейтрально
pub fn rsi_zone(rsi: &[Option<f64>], config: &FlagConfig) -> Vec<Option<i8>> {
    rsi.iter()
        .map(|value| {
            let value = (*value)?;
            Some(if value > config.rsi_overbought {
                -1
            } else if value < config.rsi_oversold {
                1
            } else {
                0
            })
        })
        .collect()
}

/// Аномальный объём: z-оценка выше порога
pub fn volume_anomaly(zscore: &[Option<f64>], config: &FlagConfig) -> Vec<Option<bool>> {
    zscore
        .iter()
        .map(|z| Some((*z)? > config.volume_anomaly_zscore))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_zone() {
        let config = FlagConfig::default();
        let out = rsi_zone(&[Some(75.0), Some(50.0), Some(25.0), None, Some(70.0)], &config);
        // thresholds are exclusive
        assert_eq!(out, vec![Some(-1), Some(0), Some(1), None, Some(0)]);
    }

    #[test]
    fn test_volume_anomaly() {
        let config = FlagConfig::default();
        let out = volume_anomaly(&[Some(2.5), Some(2.0), None], &config);
        assert_eq!(out, vec![Some(true), Some(false), None]);
    }
}
