// File: src/env_config/models/engine_config.rs
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Revision of the indicator formulas. Bump on any formula change so
/// stored rows computed under the old formulas can be told apart.
pub const FORMULA_REVISION: &str = "2.1.0";

/// Upper bound for the 5-minute aggregation window (one day).
pub const MAX_FIVEMIN_WINDOW_MINUTES: i64 = 1_440;

/// Smoothing family used by RSI, ATR and ADX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMethod {
    /// Wilder RMA, alpha = 1/period.
    Wilder,
    /// Arithmetic mean of the last `period` values.
    Simple,
    /// EMA, alpha = 2/(period + 1).
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StdDevConvention {
    Population,
    Sample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StochasticVariant {
    Fast,
    Slow,
}

/// Immutable engine configuration. Passed by reference into every
/// calculator; its fingerprint is part of `logic_version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub smoothing: SmoothingConfig,
    pub windows: WindowConfig,
    pub bollinger: BollingerConfig,
    pub stochastic: StochasticConfig,
    pub ichimoku: IchimokuConfig,
    pub volume_profile: VolumeProfileConfig,
    pub growth: GrowthConfig,
    pub regime: RegimeConfig,
    pub cycle_score: CycleScoreConfig,
    pub flags: FlagConfig,
    pub nested: NestedConfig,
    pub targets: TargetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub rsi: SmoothingMethod,
    pub atr: SmoothingMethod,
    pub adx: SmoothingMethod,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            rsi: SmoothingMethod::Wilder,
            atr: SmoothingMethod::Wilder,
            adx: SmoothingMethod::Wilder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr: usize,
    pub adx: usize,
    pub cci: usize,
    pub mfi: usize,
    pub cmf: usize,
    pub williams_r: usize,
    pub aroon: usize,
    pub donchian: usize,
    pub keltner_ema: usize,
    pub keltner_multiplier: f64,
    pub volume: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            rsi: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr: 14,
            adx: 14,
            cci: 20,
            mfi: 14,
            cmf: 20,
            williams_r: 14,
            aroon: 25,
            donchian: 20,
            keltner_ema: 20,
            keltner_multiplier: 2.0,
            volume: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BollingerConfig {
    pub period: usize,
    pub k: f64,
    pub std_dev: StdDevConvention,
}

impl Default for BollingerConfig {
    fn default() -> Self {
        Self {
            period: 20,
            k: 2.0,
            std_dev: StdDevConvention::Population,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StochasticConfig {
    pub k_period: usize,
    /// SMA applied to raw %K in the slow variant.
    pub smoothing: usize,
    pub d_period: usize,
    pub variant: StochasticVariant,
}

impl Default for StochasticConfig {
    fn default() -> Self {
        Self {
            k_period: 14,
            smoothing: 3,
            d_period: 3,
            variant: StochasticVariant::Slow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IchimokuConfig {
    pub tenkan: usize,
    pub kijun: usize,
    pub senkou_b: usize,
    pub displacement: usize,
}

impl Default for IchimokuConfig {
    fn default() -> Self {
        Self {
            tenkan: 9,
            kijun: 26,
            senkou_b: 52,
            displacement: 26,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeProfileConfig {
    pub window: usize,
    pub bins: usize,
    pub value_area_pct: f64,
}

impl Default for VolumeProfileConfig {
    fn default() -> Self {
        Self {
            window: 50,
            bins: 24,
            value_area_pct: 0.70,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    pub rsi_min: f64,
    pub rsi_max: f64,
    pub adx_min: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            rsi_min: 50.0,
            rsi_max: 70.0,
            adx_min: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    pub adx_strong: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self { adx_strong: 25.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleScoreConfig {
    pub rsi_bullish: f64,
    pub adx_trend: f64,
}

impl Default for CycleScoreConfig {
    fn default() -> Self {
        Self {
            rsi_bullish: 50.0,
            adx_trend: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagConfig {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub volume_anomaly_zscore: f64,
}

impl Default for FlagConfig {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            volume_anomaly_zscore: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedConfig {
    pub daily_weight: f64,
    pub hourly_weight: f64,
    pub fivemin_weight: f64,
    /// Length of the 5-minute window ending at the hourly bar's close.
    pub fivemin_window_minutes: i64,
    pub fivemin_bullish_pct: f64,
    pub entry: EntryBands,
    pub recommendation: RecommendationBands,
}

impl Default for NestedConfig {
    fn default() -> Self {
        Self {
            daily_weight: 0.5,
            hourly_weight: 0.3,
            fivemin_weight: 0.2,
            fivemin_window_minutes: 60,
            fivemin_bullish_pct: 0.5,
            entry: EntryBands::default(),
            recommendation: RecommendationBands::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryBands {
    pub execute: f64,
    pub ready: f64,
    pub watch: f64,
}

impl Default for EntryBands {
    fn default() -> Self {
        Self {
            execute: 80.0,
            ready: 65.0,
            watch: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationBands {
    pub ultra_buy: f64,
    pub strong_buy: f64,
    pub buy: f64,
    pub weak_buy: f64,
}

impl Default for RecommendationBands {
    fn default() -> Self {
        Self {
            ultra_buy: 90.0,
            strong_buy: 75.0,
            buy: 60.0,
            weak_buy: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Forward moves within ±band (percent) are labelled neutral.
    pub neutral_band_pct: f64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            neutral_band_pct: 0.2,
        }
    }
}

impl EngineConfig {
    /// Rejects configurations the calculators cannot honour.
    pub fn validate(&self) -> Result<(), EngineError> {
        let w = &self.windows;
        let windows = [
            ("windows.rsi", w.rsi),
            ("windows.macd_fast", w.macd_fast),
            ("windows.macd_slow", w.macd_slow),
            ("windows.macd_signal", w.macd_signal),
            ("windows.atr", w.atr),
            ("windows.adx", w.adx),
            ("windows.cci", w.cci),
            ("windows.mfi", w.mfi),
            ("windows.cmf", w.cmf),
            ("windows.williams_r", w.williams_r),
            ("windows.aroon", w.aroon),
            ("windows.donchian", w.donchian),
            ("windows.keltner_ema", w.keltner_ema),
            ("windows.volume", w.volume),
            ("bollinger.period", self.bollinger.period),
            ("stochastic.k_period", self.stochastic.k_period),
            ("stochastic.smoothing", self.stochastic.smoothing),
            ("stochastic.d_period", self.stochastic.d_period),
            ("ichimoku.tenkan", self.ichimoku.tenkan),
            ("ichimoku.kijun", self.ichimoku.kijun),
            ("ichimoku.senkou_b", self.ichimoku.senkou_b),
            ("volume_profile.window", self.volume_profile.window),
            ("volume_profile.bins", self.volume_profile.bins),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, v)| *v == 0) {
            return Err(EngineError::invalid_config(format!("{name} must be > 0")));
        }
        if w.macd_fast >= w.macd_slow {
            return Err(EngineError::invalid_config(
                "windows.macd_fast must be shorter than windows.macd_slow",
            ));
        }
        if self.bollinger.k <= 0.0 || w.keltner_multiplier <= 0.0 {
            return Err(EngineError::invalid_config("band multipliers must be positive"));
        }
        let va = self.volume_profile.value_area_pct;
        if !(va > 0.0 && va <= 1.0) {
            return Err(EngineError::invalid_config(
                "volume_profile.value_area_pct must be in (0, 1]",
            ));
        }
        if self.growth.rsi_min > self.growth.rsi_max {
            return Err(EngineError::invalid_config("growth.rsi_min exceeds growth.rsi_max"));
        }
        if self.flags.rsi_oversold >= self.flags.rsi_overbought {
            return Err(EngineError::invalid_config(
                "flags.rsi_oversold must be below flags.rsi_overbought",
            ));
        }

        let n = &self.nested;
        let weights = [n.daily_weight, n.hourly_weight, n.fivemin_weight];
        if weights.iter().any(|w| *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            return Err(EngineError::invalid_config(
                "nested weights must be non-negative with a positive sum",
            ));
        }
        if n.fivemin_window_minutes <= 0 || n.fivemin_window_minutes > MAX_FIVEMIN_WINDOW_MINUTES {
            return Err(EngineError::invalid_config(format!(
                "nested.fivemin_window_minutes must be in 1..={}",
                MAX_FIVEMIN_WINDOW_MINUTES
            )));
        }
        if !(n.entry.execute >= n.entry.ready && n.entry.ready >= n.entry.watch) {
            return Err(EngineError::invalid_config("nested.entry bands must be descending"));
        }
        let r = &n.recommendation;
        if !(r.ultra_buy >= r.strong_buy && r.strong_buy >= r.buy && r.buy >= r.weak_buy) {
            return Err(EngineError::invalid_config(
                "nested.recommendation bands must be descending",
            ));
        }
        if self.targets.neutral_band_pct < 0.0 {
            return Err(EngineError::invalid_config("targets.neutral_band_pct must be >= 0"));
        }
        Ok(())
    }

    /// `"{FORMULA_REVISION}+{hash8}"`, where `hash8` fingerprints the
    /// canonical JSON of this configuration.
    pub fn logic_version(&self) -> String {
        // Struct fields serialize in declaration order, so the JSON is canonical.
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&canonical);
        format!("{}+{}", FORMULA_REVISION, &hex::encode(digest)[..8])
    }
}
