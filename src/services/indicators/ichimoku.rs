//! Ichimoku Kinko Hyo.
//!
//! Senkou spans are projected `displacement` bars forward: the value
//! stored at bar `i` is the span computed at bar `i - displacement`. The
//! chikou span is not produced, it is a backward shift of future closes.

use super::Column;
use super::rolling::{rolling_max, rolling_min, shift_forward};
use crate::env_config::models::engine_config::IchimokuConfig;

pub struct IchimokuColumns {
    pub tenkan_sen: Column,
    pub kijun_sen: Column,
    pub senkou_span_a: Column,
    pub senkou_span_b: Column,
}

/// Unshifted spans, exposed for callers that need the raw projection.
pub struct RawSpans {
    pub span_a: Column,
    pub span_b: Column,
}

pub fn ichimoku(highs: &[f64], lows: &[f64], config: &IchimokuConfig) -> IchimokuColumns {
    let tenkan_sen = midpoint(highs, lows, config.tenkan);
    let kijun_sen = midpoint(highs, lows, config.kijun);
    let raw = raw_spans(highs, lows, &tenkan_sen, &kijun_sen, config);

    IchimokuColumns {
        senkou_span_a: shift_forward(&raw.span_a, config.displacement),
        senkou_span_b: shift_forward(&raw.span_b, config.displacement),
        tenkan_sen,
        kijun_sen,
    }
}

pub fn raw_spans(
    highs: &[f64],
    lows: &[f64],
    tenkan_sen: &[Option<f64>],
    kijun_sen: &[Option<f64>],
    config: &IchimokuConfig,
) -> RawSpans {
    let span_a = tenkan_sen
        .iter()
        .zip(kijun_sen)
        .map(|(t, k)| Some(((*t)? + (*k)?) / 2.0))
        .collect();
    let span_b = midpoint(highs, lows, config.senkou_b);
    RawSpans { span_a, span_b }
}

/// (highest high + lowest low) / 2 over `period` bars.
fn midpoint(highs: &[f64], lows: &[f64], period: usize) -> Column {
    let hh = rolling_max(highs, period);
    let ll = rolling_min(lows, period);
    hh.iter()
        .zip(&ll)
        .map(|(h, l)| Some(((*h)? + (*l)?) / 2.0))
        .collect()
}
