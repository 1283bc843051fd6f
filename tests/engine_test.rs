// File: tests/engine_test.rs
use signal_engine::env_config::models::engine_config::{EngineConfig, SmoothingMethod};
use signal_engine::services::assembler::{RunStamp, to_json_lines};
use signal_engine::services::indicators::ichimoku::raw_spans;
use signal_engine::services::indicators::momentum::rsi;
use signal_engine::services::indicators::{IndicatorFrame, compute_indicators};
use signal_engine::services::normalizer::normalize;
use signal_engine::services::pipeline::SymbolPipeline;
use signal_engine::services::scores::compute_scores;
use signal_engine::types::{RawBar, RawNumber, RawTimestamp, SortedBarSeries, Timeframe};

const START: i64 = 1_704_067_200;
const DAY: i64 = 86_400;

fn raw_bars(symbol: &str, closes: &[f64]) -> Vec<RawBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let open = if i == 0 { *close } else { closes[i - 1] };
            RawBar {
                symbol: symbol.to_string(),
                asset_type: "stock".to_string(),
                timestamp: RawTimestamp::Epoch(START + i as i64 * DAY),
                open: RawNumber::Number(open),
                high: RawNumber::Number(open.max(*close) + 0.5),
                low: RawNumber::Number(open.min(*close) - 0.5),
                close: RawNumber::Number(*close),
                volume: Some(RawNumber::Text(format!("{}", 1_000 + (i % 7) * 150))),
            }
        })
        .collect()
}

fn wave(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 100.0 + (i as f64 * 0.15).sin() * 8.0 + (i as f64 * 0.04).cos() * 5.0 + i as f64 * 0.02)
        .collect()
}

fn series(closes: &[f64]) -> SortedBarSeries {
    normalize("TEST", Timeframe::Daily, &raw_bars("TEST", closes)).unwrap()
}

fn frame(closes: &[f64]) -> (SortedBarSeries, IndicatorFrame) {
    let series = series(closes);
    let frame = compute_indicators(&series, &EngineConfig::default());
    (series, frame)
}

#[test]
fn test_bounded_oscillators_stay_in_range() {
    let (_, frame) = frame(&wave(400));
    for column in [&frame.rsi, &frame.adx, &frame.stoch_k, &frame.stoch_d, &frame.mfi, &frame.aroon_up] {
        for value in column.iter().flatten() {
            assert!((0.0..=100.0).contains(value), "value out of range: {value}");
        }
    }
    assert!(frame.rsi.iter().flatten().count() > 300);
}

#[test]
fn test_bollinger_bands_are_ordered() {
    let (_, frame) = frame(&wave(300));
    let rows = frame
        .bollinger_lower
        .iter()
        .zip(&frame.bollinger_middle)
        .zip(&frame.bollinger_upper);
    let mut defined = 0;
    for ((lower, middle), upper) in rows {
        if let (Some(l), Some(m), Some(u)) = (lower, middle, upper) {
            assert!(l <= m && m <= u);
            defined += 1;
        }
    }
    assert_eq!(defined, 300 - 19);
}

#[test]
fn test_monotonic_series_saturates_rsi() {
    let rising: Vec<f64> = (0..60).map(|i| 50.0 + i as f64).collect();
    let (_, up) = frame(&rising);
    assert_eq!(up.rsi[59], Some(100.0));

    let falling: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
    let (_, down) = frame(&falling);
    let last = down.rsi[59].unwrap();
    assert!(last.abs() < 1e-9);
}

#[test]
fn test_rsi_short_window_without_losses() {
    let closes = [10.0, 10.0, 10.0, 10.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
    let out = rsi(&closes, 4, SmoothingMethod::Wilder);
    assert_eq!(out.len(), 10);
    assert!(out[3].is_none());
    assert!(out[4].is_some());
    assert_eq!(out[9], Some(100.0));
}

#[test]
fn test_macd_cross_flag_matches_histogram_sign_change() {
    let (_, frame) = frame(&wave(400));
    let mut crosses = 0;
    for i in 1..frame.len() {
        let expected = match (frame.macd_histogram[i - 1], frame.macd_histogram[i]) {
            (Some(prev), Some(curr)) if prev <= 0.0 && curr > 0.0 => 1,
            (Some(prev), Some(curr)) if prev >= 0.0 && curr < 0.0 => -1,
            _ => 0,
        };
        assert_eq!(frame.macd_cross_flag[i], expected, "bar {i}");
        if expected != 0 {
            crosses += 1;
        }
    }
    assert!(crosses > 0);
    assert_eq!(frame.macd_cross_flag[0], 0);
}

#[test]
fn test_growth_score_is_multiple_of_25() {
    let closes = wave(320);
    let (series, frame) = frame(&closes);
    let scores = compute_scores(&series.closes(), &frame, &EngineConfig::default());
    let defined: Vec<u8> = scores.growth_score.iter().flatten().copied().collect();
    assert!(!defined.is_empty());
    assert!(defined.iter().all(|s| s % 25 == 0 && *s <= 100));
    assert!(scores.growth_score[..199].iter().all(Option::is_none));
}

#[test]
fn test_short_series_yields_null_columns() {
    let (_, frame) = frame(&wave(10));
    assert_eq!(frame.len(), 10);
    assert!(frame.is_aligned());
    assert!(frame.sma_20.iter().all(Option::is_none));
    assert!(frame.rsi.iter().all(Option::is_none));
    assert!(frame.macd_signal.iter().all(Option::is_none));
    assert!(frame.sma_5[4].is_some());
    assert!(frame.macd_cross_flag.iter().all(|f| *f == 0));
}

#[test]
fn test_ichimoku_spans_are_projected_forward() {
    let closes = wave(200);
    let (series, frame) = frame(&closes);
    let config = EngineConfig::default().ichimoku;
    let raw = raw_spans(
        &series.highs(),
        &series.lows(),
        &frame.tenkan_sen,
        &frame.kijun_sen,
        &config,
    );
    let shift = config.displacement;
    for i in shift..frame.len() {
        assert_eq!(frame.senkou_span_a[i], raw.span_a[i - shift]);
        assert_eq!(frame.senkou_span_b[i], raw.span_b[i - shift]);
    }
    assert!(frame.senkou_span_a[..shift].iter().all(Option::is_none));
}

#[test]
fn test_rise_cycle_starts_once_on_v_shape() {
    let mut closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
    closes.extend((1..=80).map(|i| 141.0 + i as f64));
    let (series, frame) = frame(&closes);
    let scores = compute_scores(&series.closes(), &frame, &EngineConfig::default());

    let starts: Vec<usize> = scores
        .rise_cycle_start
        .iter()
        .enumerate()
        .filter(|(_, start)| **start)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(starts.len(), 1);
    assert!(starts[0] > 60);
    assert!(scores.fall_cycle_start.iter().all(|f| !f));
    assert_eq!(scores.in_rise_cycle[139], Some(true));
}

#[test]
fn test_pipeline_output_is_deterministic() {
    let raw = raw_bars("AAPL", &wave(250));
    let config = EngineConfig::default();
    let stamp = RunStamp {
        logic_version: config.logic_version(),
        computed_at: 1_700_000_000,
    };
    let pipeline = SymbolPipeline::new(&config, &stamp);

    let first = pipeline.run_series("AAPL", Timeframe::Daily, &raw).unwrap();
    let mut shuffled = raw.clone();
    shuffled.reverse();
    let second = pipeline.run_series("AAPL", Timeframe::Daily, &shuffled).unwrap();

    let lines = to_json_lines(&first.batch.records).unwrap();
    assert_eq!(lines, to_json_lines(&second.batch.records).unwrap());
    assert_eq!(lines.lines().count(), 250);
    assert!(!lines.contains("NaN"));
}

#[test]
fn test_malformed_price_rejects_symbol() {
    let mut raw = raw_bars("MSFT", &wave(30));
    raw[12].close = RawNumber::Text("n/a".to_string());
    let err = normalize("MSFT", Timeframe::Daily, &raw).unwrap_err();
    assert!(err.to_string().contains("close"));
}
