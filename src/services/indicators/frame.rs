//! Columnar indicator output for one series, plus its per-bar row view.

use super::Column;
use serde::Serialize;

/// Maps NaN and ±Inf to null. Applied to every float before emission.
#[inline]
pub fn sanitize(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

macro_rules! indicator_frame {
    (
        columns { $($col:ident),* $(,)? }
        events { $($event:ident),* $(,)? }
    ) => {
        /// One column per indicator, all the same length as the series.
        #[derive(Debug, Clone, PartialEq)]
        pub struct IndicatorFrame {
            len: usize,
            $(pub $col: Column,)*
            $(pub $event: Vec<i8>,)*
        }

        /// Indicator values of a single bar.
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct IndicatorValues {
            $(pub $col: Option<f64>,)*
            $(pub $event: i8,)*
        }

        impl IndicatorFrame {
            pub const COLUMN_NAMES: &'static [&'static str] =
                &[$(stringify!($col),)* $(stringify!($event),)*];

            pub fn with_len(len: usize) -> Self {
                Self {
                    len,
                    $($col: vec![None; len],)*
                    $($event: vec![0; len],)*
                }
            }

            pub fn len(&self) -> usize {
                self.len
            }

            pub fn is_empty(&self) -> bool {
                self.len == 0
            }

            /// Row view of bar `i`; out-of-range positions read as undefined.
            pub fn values_at(&self, i: usize) -> IndicatorValues {
                IndicatorValues {
                    $($col: sanitize(self.$col.get(i).copied().flatten()),)*
                    $($event: self.$event.get(i).copied().unwrap_or(0),)*
                }
            }

            /// Float column by its output name.
            pub fn column(&self, name: &str) -> Option<&Column> {
                match name {
                    $(stringify!($col) => Some(&self.$col),)*
                    _ => None,
                }
            }

            /// Checks every column has the frame length.
            pub fn is_aligned(&self) -> bool {
                true $(&& self.$col.len() == self.len)* $(&& self.$event.len() == self.len)*
            }
        }
    };
}

indicator_frame! {
    columns {
        // moving averages
        sma_5, sma_10, sma_20, sma_50, sma_100, sma_200,
        ema_5, ema_10, ema_12, ema_20, ema_26, ema_50, ema_100, ema_200,
        wma_20, vwma_20,
        // macd
        macd, macd_signal, macd_histogram,
        // momentum
        rsi, stoch_k, stoch_d, stoch_rsi, williams_r, cci, roc_10, momentum_10,
        // volume flow
        obv, mfi, cmf, volume_sma_20, volume_ratio, volume_zscore,
        // volatility
        true_range, atr, natr,
        bollinger_upper, bollinger_middle, bollinger_lower, bollinger_width, bollinger_percent_b,
        keltner_upper, keltner_middle, keltner_lower,
        donchian_upper, donchian_middle, donchian_lower,
        volatility_20,
        // trend strength
        adx, plus_di, minus_di, aroon_up, aroon_down, aroon_oscillator,
        // ichimoku
        tenkan_sen, kijun_sen, senkou_span_a, senkou_span_b,
        // volume profile
        vp_poc, vp_vah, vp_val,
        // structure
        return_1, return_5, log_return_1,
        high_252, low_252, pct_from_high_252, distance_sma_200_pct,
        body_pct, upper_wick_pct, lower_wick_pct, gap_pct,
        pivot, pivot_r1, pivot_s1,
    }
    events {
        macd_cross_flag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_len_is_all_null() {
        let frame = IndicatorFrame::with_len(3);
        assert!(frame.is_aligned());
        let row = frame.values_at(1);
        assert_eq!(row.rsi, None);
        assert_eq!(row.macd_cross_flag, 0);
        assert!(IndicatorFrame::COLUMN_NAMES.len() > 70);
    }

    #[test]
    fn test_values_at_sanitizes_non_finite() {
        let mut frame = IndicatorFrame::with_len(2);
        frame.rsi = vec![Some(f64::NAN), Some(42.0)];
        frame.atr = vec![Some(f64::INFINITY), None];
        assert_eq!(frame.values_at(0).rsi, None);
        assert_eq!(frame.values_at(0).atr, None);
        assert_eq!(frame.values_at(1).rsi, Some(42.0));
        assert_eq!(frame.values_at(5).rsi, None);
    }

    #[test]
    fn test_column_lookup_by_name() {
        let mut frame = IndicatorFrame::with_len(1);
        frame.vp_poc = vec![Some(1.5)];
        assert_eq!(frame.column("vp_poc"), Some(&vec![Some(1.5)]));
        assert!(frame.column("rsi_14").is_none());
    }

    #[test]
    fn test_row_serializes_null_as_json_null() {
        let frame = IndicatorFrame::with_len(1);
        let json = serde_json::to_value(frame.values_at(0)).unwrap();
        assert!(json["sma_200"].is_null());
        assert_eq!(json["macd_cross_flag"], 0);
    }
}
