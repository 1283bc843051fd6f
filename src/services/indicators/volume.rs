//! Volume-flow indicators. Every function returns an all-null column
//! when `volumes` is `None` (volumeless asset).

use super::Column;
use super::rolling::{rolling_std, safe_div};
use super::smoothing::{self, lift};
use crate::env_config::models::engine_config::StdDevConvention;

/// On-Balance Volume, starting at 0 on the first bar.
pub fn obv(closes: &[f64], volumes: Option<&[f64]>) -> Column {
    let Some(volumes) = volumes else {
        return vec![None; closes.len()];
    };
    let mut out = Vec::with_capacity(closes.len());
    let mut running = 0.0;
    for i in 0..closes.len() {
        if i > 0 {
            if closes[i] > closes[i - 1] {
                running += volumes[i];
            } else if closes[i] < closes[i - 1] {
                running -= volumes[i];
            }
        }
        out.push(Some(running));
    }
    out
}

/// Money Flow Index over `period` typical-price changes.
///
/// No negative flow gives 100, no flow at all gives 50.
pub fn mfi(highs: &[f64], lows: &[f64], closes: &[f64], volumes: Option<&[f64]>, period: usize) -> Column {
    let n = closes.len();
    let mut out = vec![None; n];
    let Some(volumes) = volumes else {
        return out;
    };
    if period == 0 {
        return out;
    }

    let typical: Vec<f64> = (0..n).map(|i| (highs[i] + lows[i] + closes[i]) / 3.0).collect();
    for i in period..n {
        let mut positive = 0.0;
        let mut negative = 0.0;
        for j in (i + 1 - period)..=i {
            let flow = typical[j] * volumes[j];
            if typical[j] > typical[j - 1] {
                positive += flow;
            } else if typical[j] < typical[j - 1] {
                negative += flow;
            }
        }
        out[i] = Some(if positive + negative == 0.0 {
            50.0
        } else if negative == 0.0 {
            100.0
        } else {
            (100.0 - 100.0 / (1.0 + positive / negative)).clamp(0.0, 100.0)
        });
    }
    out
}

/// Chaikin Money Flow: windowed money-flow volume over windowed volume.
pub fn cmf(highs: &[f64], lows: &[f64], closes: &[f64], volumes: Option<&[f64]>, period: usize) -> Column {
    let n = closes.len();
    let mut out = vec![None; n];
    let Some(volumes) = volumes else {
        return out;
    };
    if period == 0 {
        return out;
    }

    let flow_volume: Vec<f64> = (0..n)
        .map(|i| {
            let range = highs[i] - lows[i];
            let multiplier = safe_div((closes[i] - lows[i]) - (highs[i] - closes[i]), range, 0.0);
            multiplier * volumes[i]
        })
        .collect();
    for i in (period - 1)..n {
        let window = i + 1 - period..=i;
        let mfv: f64 = flow_volume[window.clone()].iter().sum();
        let vol: f64 = volumes[window].iter().sum();
        out[i] = Some(safe_div(mfv, vol, 0.0));
    }
    out
}

pub struct VolumeStatsColumns {
    pub sma: Column,
    /// volume / windowed mean, 0 when the mean is 0
    pub ratio: Column,
    /// (volume - mean) / sample sigma, 0 when sigma is 0
    pub zscore: Column,
}

/// Windowed volume mean, ratio and z-score. Each window is evaluated on
/// its own (mean first, then squared deviations), so a burst of huge
/// volumes leaving the window does not disturb later sigmas.
pub fn volume_stats(volumes: Option<&[f64]>, len: usize, window: usize) -> VolumeStatsColumns {
    let Some(volumes) = volumes else {
        return VolumeStatsColumns {
            sma: vec![None; len],
            ratio: vec![None; len],
            zscore: vec![None; len],
        };
    };

    let values = lift(volumes);
    let sma = smoothing::sma(&values, window);
    let sigma = rolling_std(&values, window, StdDevConvention::Sample);

    let ratio = volumes
        .iter()
        .zip(&sma)
        .map(|(volume, mean)| Some(safe_div(*volume, (*mean)?, 0.0)))
        .collect();
    let zscore = volumes
        .iter()
        .zip(sma.iter().zip(&sigma))
        .map(|(volume, (mean, sigma))| Some(safe_div(volume - (*mean)?, (*sigma)?, 0.0)))
        .collect();

    VolumeStatsColumns { sma, ratio, zscore }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volumeless_is_null() {
        let closes = [1.0, 2.0, 3.0];
        assert!(obv(&closes, None).iter().all(Option::is_none));
        assert!(mfi(&closes, &closes, &closes, None, 2).iter().all(Option::is_none));
        assert!(cmf(&closes, &closes, &closes, None, 2).iter().all(Option::is_none));
        assert!(volume_stats(None, 3, 2).zscore.iter().all(Option::is_none));
    }

    #[test]
    fn test_obv_accumulates_signed_volume() {
        let closes = [10.0, 11.0, 11.0, 9.0];
        let volumes = [100.0, 50.0, 70.0, 30.0];
        let out = obv(&closes, Some(&volumes));
        assert_eq!(out, vec![Some(0.0), Some(50.0), Some(50.0), Some(20.0)]);
    }

    #[test]
    fn test_mfi_extremes() {
        let up: Vec<f64> = (0..10).map(|i| 10.0 + i as f64).collect();
        let volumes = vec![100.0; 10];
        let out = mfi(&up, &up, &up, Some(&volumes), 3);
        assert_eq!(out[2], None);
        assert_eq!(out[3], Some(100.0));

        let flat = vec![10.0; 10];
        assert_eq!(mfi(&flat, &flat, &flat, Some(&volumes), 3)[9], Some(50.0));
    }

    #[test]
    fn test_cmf_close_at_high_is_one() {
        let highs = [11.0, 12.0, 13.0];
        let lows = [9.0, 10.0, 11.0];
        let volumes = [10.0, 20.0, 30.0];
        let out = cmf(&highs, &lows, &highs, Some(&volumes), 2);
        assert_eq!(out[2], Some(1.0));
        assert_eq!(cmf(&highs, &lows, &highs, Some(&[0.0, 0.0, 0.0]), 2)[2], Some(0.0));
    }

    #[test]
    fn test_volume_stats() {
        let volumes = [10.0, 10.0, 10.0, 40.0];
        let out = volume_stats(Some(&volumes), 4, 3);
        assert_eq!(out.sma[1], None);
        assert_eq!(out.sma[2], Some(10.0));
        // zero sigma guarded
        assert_eq!(out.zscore[2], Some(0.0));
        assert_eq!(out.sma[3], Some(20.0));
        assert_eq!(out.ratio[3], Some(2.0));
        // sigma of (10, 10, 40) = sqrt(300)
        assert!((out.zscore[3].unwrap() - 20.0 / 300f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_zscore_after_huge_volumes_leave_window() {
        let mut volumes: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1e12 } else { 1.0 }).collect();
        volumes.extend(std::iter::repeat_n(100.0, 19));
        volumes.push(150.0);
        let out = volume_stats(Some(&volumes), volumes.len(), 20);

        let last = volumes.len() - 1;
        assert_eq!(out.sma[last], Some(102.5));
        // 19 * 2.5^2 + 47.5^2 = 2375, sample variance 125
        let expected = 47.5 / 125f64.sqrt();
        assert!((out.zscore[last].unwrap() - expected).abs() < 1e-9);
        assert!(out.zscore[last].unwrap() > 4.0);
    }
}
