// File: src/services/pipeline.rs
//! Per-symbol orchestration: normalizer, indicators, scores, targets and
//! assembler, strictly in that order. Pure and synchronous.

use crate::env_config::models::engine_config::EngineConfig;
use crate::error::EngineError;
use crate::services::assembler::{
    self, NestedScoreRecord, RunStamp, SeriesFrames, SignalRecord, UpsertBatch,
};
use crate::services::indicators::{IndicatorFrame, compute_indicators};
use crate::services::normalizer::normalize;
use crate::services::scores::{NestedAligner, TimeframeInput, compute_scores};
use crate::services::targets::{compute_lagged, compute_targets};
use crate::types::{RawBar, SortedBarSeries, Timeframe};
use tracing::debug;

/// Result for one timeframe of one symbol.
pub struct SeriesOutput {
    pub series: SortedBarSeries,
    pub indicators: IndicatorFrame,
    pub batch: UpsertBatch<SignalRecord>,
}

/// Everything produced for one symbol in one run.
pub struct SymbolOutput {
    pub symbol: String,
    pub signals: Vec<UpsertBatch<SignalRecord>>,
    pub nested: Option<UpsertBatch<NestedScoreRecord>>,
}

impl SymbolOutput {
    pub fn row_count(&self) -> usize {
        self.signals.iter().map(UpsertBatch::len).sum::<usize>()
            + self.nested.as_ref().map_or(0, UpsertBatch::len)
    }
}

pub struct SymbolPipeline<'a> {
    config: &'a EngineConfig,
    stamp: &'a RunStamp,
}

impl<'a> SymbolPipeline<'a> {
    pub fn new(config: &'a EngineConfig, stamp: &'a RunStamp) -> Self {
        Self { config, stamp }
    }

    /// Runs one symbol/timeframe series end to end.
    pub fn run_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        raw: &[RawBar],
    ) -> Result<SeriesOutput, EngineError> {
        let series = normalize(symbol, timeframe, raw)?;
        let closes = series.closes();

        let indicators = compute_indicators(&series, self.config);
        let scores = compute_scores(&closes, &indicators, self.config);
        let lagged = compute_lagged(&series, &indicators);
        let targets = compute_targets(&closes, &self.config.targets);

        let batch = assembler::assemble(
            &series,
            SeriesFrames {
                indicators: &indicators,
                scores: &scores,
                lagged: &lagged,
                targets: &targets,
            },
            self.stamp,
        );

        Ok(SeriesOutput {
            series,
            indicators,
            batch,
        })
    }

    /// Runs every loaded timeframe of a symbol. Timeframes without bars
    /// are skipped; nested scores need daily, hourly and 5-minute data.
    pub fn run_symbol(
        &self,
        symbol: &str,
        raw: &[(Timeframe, Vec<RawBar>)],
        nested_enabled: bool,
    ) -> Result<SymbolOutput, EngineError> {
        let mut outputs: Vec<(Timeframe, SeriesOutput)> = Vec::with_capacity(raw.len());
        for (timeframe, bars) in raw {
            if bars.is_empty() {
                debug!("No {} bars for {}, skipping timeframe", timeframe, symbol);
                continue;
            }
            outputs.push((*timeframe, self.run_series(symbol, *timeframe, bars)?));
        }

        let nested = if nested_enabled {
            self.run_nested(symbol, &outputs)?
        } else {
            None
        };

        Ok(SymbolOutput {
            symbol: symbol.to_string(),
            signals: outputs.into_iter().map(|(_, output)| output.batch).collect(),
            nested,
        })
    }

    fn run_nested(
        &self,
        symbol: &str,
        outputs: &[(Timeframe, SeriesOutput)],
    ) -> Result<Option<UpsertBatch<NestedScoreRecord>>, EngineError> {
        let find = |wanted: Timeframe| {
            outputs
                .iter()
                .find(|(timeframe, _)| *timeframe == wanted)
                .map(|(_, output)| TimeframeInput {
                    series: &output.series,
                    frame: &output.indicators,
                })
        };
        let (Some(daily), Some(hourly), Some(fivemin)) = (
            find(Timeframe::Daily),
            find(Timeframe::Hourly),
            find(Timeframe::FiveMinute),
        ) else {
            debug!("Nested score skipped for {}: not all timeframes loaded", symbol);
            return Ok(None);
        };

        let scores = NestedAligner::new(&self.config.nested).align(daily, hourly, fivemin)?;
        Ok(Some(assembler::assemble_nested(symbol, scores, self.stamp)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalizer::test_support::{START, raw_bar};

    fn stamp() -> RunStamp {
        RunStamp {
            logic_version: EngineConfig::default().logic_version(),
            computed_at: 0,
        }
    }

    fn bars(step: i64, count: usize) -> Vec<RawBar> {
        (0..count)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.3).sin() * 3.0 + i as f64 * 0.05;
                raw_bar("SPY", START + i as i64 * step, close, Some(500.0))
            })
            .collect()
    }

    #[test]
    fn test_run_symbol_all_timeframes() {
        let config = EngineConfig::default();
        let stamp = stamp();
        let pipeline = SymbolPipeline::new(&config, &stamp);
        let raw = vec![
            (Timeframe::Daily, bars(86_400, 30)),
            (Timeframe::Hourly, bars(3_600, 30 * 24)),
            (Timeframe::FiveMinute, bars(300, 30 * 24 * 12)),
        ];
        let out = pipeline.run_symbol("SPY", &raw, true).unwrap();
        assert_eq!(out.signals.len(), 3);
        let nested = out.nested.as_ref().unwrap();
        assert_eq!(nested.len(), 30 * 24);
        assert_eq!(nested.timeframe, Timeframe::Hourly);
        assert_eq!(out.row_count(), 30 + 720 + 8_640 + 720);
    }

    #[test]
    fn test_missing_timeframe_skips_nested() {
        let config = EngineConfig::default();
        let stamp = stamp();
        let pipeline = SymbolPipeline::new(&config, &stamp);
        let raw = vec![
            (Timeframe::Daily, bars(86_400, 10)),
            (Timeframe::Hourly, Vec::new()),
        ];
        let out = pipeline.run_symbol("SPY", &raw, true).unwrap();
        assert_eq!(out.signals.len(), 1);
        assert!(out.nested.is_none());
    }

    #[test]
    fn test_malformed_bar_fails_whole_symbol() {
        let config = EngineConfig::default();
        let stamp = stamp();
        let pipeline = SymbolPipeline::new(&config, &stamp);
        let mut daily = bars(86_400, 10);
        daily[4].close = crate::types::RawNumber::Text("n/a".into());
        let err = pipeline
            .run_symbol("SPY", &[(Timeframe::Daily, daily)], false)
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::MalformedOhlc { index: 4, .. }));
    }
}
