// File: src/services/scores/growth.rs
use crate::env_config::models::engine_config::GrowthConfig;
use crate::services::indicators::IndicatorFrame;

/// Очки за одно выполненное условие
const CHECK_POINTS: u8 = 25;

/// Growth Score: four 25-point checks, RSI in band, positive MACD
/// histogram, ADX above threshold and close above SMA 200.
/// Null when any input is undefined.
pub fn growth_score(closes: &[f64], frame: &IndicatorFrame, config: &GrowthConfig) -> Vec<Option<u8>> {
    (0..closes.len())
        .map(|i| {
            let rsi = frame.rsi[i]?;
            let histogram = frame.macd_histogram[i]?;
            let adx = frame.adx[i]?;
            let sma_200 = frame.sma_200[i]?;
            Some(score(&[
                rsi >= config.rsi_min && rsi <= config.rsi_max,
                histogram > 0.0,
                adx > config.adx_min,
                closes[i] > sma_200,
            ]))
        })
        .collect()
}

fn score(checks: &[bool]) -> u8 {
    checks.iter().filter(|c| **c).count() as u8 * CHECK_POINTS
}
