// File: src/services/indicators/mod.rs
pub mod frame;
pub mod ichimoku;
pub mod macd;
pub mod momentum;
pub mod moving_average;
pub mod rolling;
pub mod smoothing;
pub mod structure;
pub mod trend;
pub mod volatility;
pub mod volume;
pub mod volume_profile;

pub use frame::{IndicatorFrame, IndicatorValues};

use crate::env_config::models::engine_config::EngineConfig;
use crate::types::SortedBarSeries;
use tracing::debug;

/// Nullable column: `None` until the indicator's warm-up is satisfied.
pub type Column = Vec<Option<f64>>;

const ROC_PERIOD: usize = 10;
const RANGE_PERIOD: usize = 252;
const VOLATILITY_PERIOD: usize = 20;

/// Рассчитывает все индикаторы по отсортированному ряду свечей
pub fn compute_indicators(series: &SortedBarSeries, config: &EngineConfig) -> IndicatorFrame {
    let opens = series.opens();
    let highs = series.highs();
    let lows = series.lows();
    let closes = series.closes();
    let volumes = series.volumes();
    let volumes = volumes.as_deref();
    let w = &config.windows;

    let mut frame = IndicatorFrame::with_len(series.len());
    let close_values = smoothing::lift(&closes);

    // Скользящие средние
    frame.sma_5 = smoothing::sma(&close_values, 5);
    frame.sma_10 = smoothing::sma(&close_values, 10);
    frame.sma_20 = smoothing::sma(&close_values, 20);
    frame.sma_50 = smoothing::sma(&close_values, 50);
    frame.sma_100 = smoothing::sma(&close_values, 100);
    frame.sma_200 = smoothing::sma(&close_values, 200);
    frame.ema_5 = smoothing::ema(&close_values, 5);
    frame.ema_10 = smoothing::ema(&close_values, 10);
    frame.ema_12 = smoothing::ema(&close_values, 12);
    frame.ema_20 = smoothing::ema(&close_values, 20);
    frame.ema_26 = smoothing::ema(&close_values, 26);
    frame.ema_50 = smoothing::ema(&close_values, 50);
    frame.ema_100 = smoothing::ema(&close_values, 100);
    frame.ema_200 = smoothing::ema(&close_values, 200);
    frame.wma_20 = moving_average::wma(&closes, 20);
    frame.vwma_20 = moving_average::vwma(&closes, volumes, 20);

    let macd = macd::macd(&closes, w.macd_fast, w.macd_slow, w.macd_signal);
    frame.macd = macd.macd;
    frame.macd_signal = macd.signal;
    frame.macd_histogram = macd.histogram;
    frame.macd_cross_flag = macd.cross_flag;

    // Осцилляторы
    frame.rsi = momentum::rsi(&closes, w.rsi, config.smoothing.rsi);
    let (stoch_k, stoch_d) = momentum::stochastic(&highs, &lows, &closes, &config.stochastic);
    frame.stoch_k = stoch_k;
    frame.stoch_d = stoch_d;
    frame.stoch_rsi = momentum::stoch_rsi(&frame.rsi, w.rsi);
    frame.williams_r = momentum::williams_r(&highs, &lows, &closes, w.williams_r);
    frame.cci = momentum::cci(&highs, &lows, &closes, w.cci);
    frame.roc_10 = momentum::roc(&closes, ROC_PERIOD);
    frame.momentum_10 = momentum::momentum(&closes, ROC_PERIOD);

    // Объёмы
    frame.obv = volume::obv(&closes, volumes);
    frame.mfi = volume::mfi(&highs, &lows, &closes, volumes, w.mfi);
    frame.cmf = volume::cmf(&highs, &lows, &closes, volumes, w.cmf);
    let volume_stats = volume::volume_stats(volumes, series.len(), w.volume);
    frame.volume_sma_20 = volume_stats.sma;
    frame.volume_ratio = volume_stats.ratio;
    frame.volume_zscore = volume_stats.zscore;

    // Волатильность
    frame.true_range = volatility::true_range(&highs, &lows, &closes);
    frame.atr = volatility::atr(&frame.true_range, w.atr, config.smoothing.atr);
    frame.natr = volatility::natr(&frame.atr, &closes);
    let bands = volatility::bollinger(&closes, &config.bollinger);
    frame.bollinger_upper = bands.upper;
    frame.bollinger_middle = bands.middle;
    frame.bollinger_lower = bands.lower;
    frame.bollinger_width = bands.width;
    frame.bollinger_percent_b = bands.percent_b;
    let keltner = volatility::keltner(&closes, &frame.atr, w.keltner_ema, w.keltner_multiplier);
    frame.keltner_upper = keltner.upper;
    frame.keltner_middle = keltner.middle;
    frame.keltner_lower = keltner.lower;
    let donchian = volatility::donchian(&highs, &lows, w.donchian);
    frame.donchian_upper = donchian.upper;
    frame.donchian_middle = donchian.middle;
    frame.donchian_lower = donchian.lower;

    // Сила тренда
    let adx = trend::adx(&highs, &lows, &closes, w.adx, config.smoothing.adx);
    frame.adx = adx.adx;
    frame.plus_di = adx.plus_di;
    frame.minus_di = adx.minus_di;
    let aroon = trend::aroon(&highs, &lows, w.aroon);
    frame.aroon_up = aroon.up;
    frame.aroon_down = aroon.down;
    frame.aroon_oscillator = aroon.oscillator;

    let cloud = ichimoku::ichimoku(&highs, &lows, &config.ichimoku);
    frame.tenkan_sen = cloud.tenkan_sen;
    frame.kijun_sen = cloud.kijun_sen;
    frame.senkou_span_a = cloud.senkou_span_a;
    frame.senkou_span_b = cloud.senkou_span_b;

    let profile = volume_profile::volume_profile(&highs, &lows, &closes, volumes, &config.volume_profile);
    frame.vp_poc = profile.poc;
    frame.vp_vah = profile.vah;
    frame.vp_val = profile.val;

    // Структура цены
    frame.return_1 = structure::simple_return(&closes, 1);
    frame.return_5 = structure::simple_return(&closes, 5);
    frame.log_return_1 = structure::log_return(&closes);
    frame.volatility_20 = structure::volatility(&frame.return_1, VOLATILITY_PERIOD);
    let range = structure::range_position(&highs, &lows, &closes, RANGE_PERIOD);
    frame.high_252 = range.high;
    frame.low_252 = range.low;
    frame.pct_from_high_252 = range.pct_from_high;
    frame.distance_sma_200_pct = structure::distance_pct(&closes, &frame.sma_200);
    let candle = structure::candle(&opens, &highs, &lows, &closes);
    frame.body_pct = candle.body_pct;
    frame.upper_wick_pct = candle.upper_wick_pct;
    frame.lower_wick_pct = candle.lower_wick_pct;
    frame.gap_pct = candle.gap_pct;
    let pivots = structure::pivots(&highs, &lows, &closes);
    frame.pivot = pivots.pivot;
    frame.pivot_r1 = pivots.r1;
    frame.pivot_s1 = pivots.s1;

    debug!(
        "Computed {} indicator columns for {} ({} bars, volume={})",
        IndicatorFrame::COLUMN_NAMES.len(),
        series.symbol(),
        series.len(),
        series.has_volume()
    );

    frame
}
