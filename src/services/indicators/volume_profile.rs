//! Rolling volume profile: Point of Control and Value Area.
//!
//! For each window of `window` bars the `[low, high]` range is split into
//! `bins` equal price bins. A bar's volume lands in the bin holding its
//! typical price. The value area grows from the POC bin one bin at a
//! time toward the neighbour holding more volume (upward on ties) until
//! it encloses `value_area_pct` of the windowed volume.

use super::Column;
use super::rolling::EPSILON;
use crate::env_config::models::engine_config::VolumeProfileConfig;

pub struct VolumeProfileColumns {
    pub poc: Column,
    pub vah: Column,
    pub val: Column,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileLevels {
    pub poc: f64,
    pub vah: f64,
    pub val: f64,
}

pub fn volume_profile(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    volumes: Option<&[f64]>,
    config: &VolumeProfileConfig,
) -> VolumeProfileColumns {
    let n = closes.len();
    let mut poc = vec![None; n];
    let mut vah = vec![None; n];
    let mut val = vec![None; n];

    let Some(volumes) = volumes else {
        return VolumeProfileColumns { poc, vah, val };
    };
    if config.window == 0 || config.bins == 0 {
        return VolumeProfileColumns { poc, vah, val };
    }

    for i in (config.window - 1)..n {
        let range = i + 1 - config.window..=i;
        if let Some(levels) = profile_levels(
            &highs[range.clone()],
            &lows[range.clone()],
            &closes[range.clone()],
            &volumes[range],
            config.bins,
            config.value_area_pct,
        ) {
            poc[i] = Some(levels.poc);
            vah[i] = Some(levels.vah);
            val[i] = Some(levels.val);
        }
    }

    VolumeProfileColumns { poc, vah, val }
}

/// Profile of one window; `None` when the window traded no volume.
pub fn profile_levels(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    volumes: &[f64],
    bins: usize,
    value_area_pct: f64,
) -> Option<ProfileLevels> {
    let total: f64 = volumes.iter().sum();
    if total <= EPSILON || bins == 0 {
        return None;
    }

    let lo = lows.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = highs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    if span <= EPSILON {
        return Some(ProfileLevels {
            poc: lo,
            vah: hi,
            val: lo,
        });
    }
    let width = span / bins as f64;

    let mut histogram = vec![0.0; bins];
    for j in 0..volumes.len() {
        let typical = (highs[j] + lows[j] + closes[j]) / 3.0;
        let idx = (((typical - lo) / width).floor().max(0.0) as usize).min(bins - 1);
        histogram[idx] += volumes[j];
    }

    // Первый бин с максимальным объёмом
    let mut poc_idx = 0;
    for (idx, v) in histogram.iter().enumerate() {
        if *v > histogram[poc_idx] {
            poc_idx = idx;
        }
    }

    let target = total * value_area_pct;
    let (mut low_idx, mut high_idx) = (poc_idx, poc_idx);
    let mut enclosed = histogram[poc_idx];
    while enclosed < target {
        let above = (high_idx + 1 < bins).then(|| histogram[high_idx + 1]);
        let below = low_idx.checked_sub(1).map(|idx| histogram[idx]);
        match (above, below) {
            (Some(up), Some(down)) if up >= down => {
                high_idx += 1;
                enclosed += up;
            }
            (_, Some(down)) => {
                low_idx -= 1;
                enclosed += down;
            }
            (Some(up), None) => {
                high_idx += 1;
                enclosed += up;
            }
            (None, None) => break,
        }
    }

    Some(ProfileLevels {
        poc: lo + (poc_idx as f64 + 0.5) * width,
        vah: lo + (high_idx + 1) as f64 * width,
        val: lo + low_idx as f64 * width,
    })
}
