//! Otsu thresholding of 8-bit volumes.

use crate::volume::Volume;

use log::{debug, warn};
use rayon::prelude::*;

const BINS: usize = 256;

/// Intensity counts for an 8-bit volume, one bin per value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; BINS],
}

impl Default for Histogram {
    fn default() -> Self {
        Self { counts: [0; BINS] }
    }
}

impl Histogram {
    pub fn from_samples(samples: &[u8]) -> Self {
        let mut histogram = Self::default();
        for &v in samples {
            histogram.counts[v as usize] += 1;
        }
        histogram
    }

    pub fn from_volume(volume: &Volume) -> Self {
        let counts = volume
            .data()
            .view()
            .into_par_iter()
            .fold(
                || [0u64; BINS],
                |mut counts, &v| {
                    counts[v as usize] += 1;
                    counts
                },
            )
            .reduce(
                || [0u64; BINS],
                |mut a, b| {
                    a.iter_mut().zip(b.iter()).for_each(|(a, b)| *a += b);
                    a
                },
            );
        Self { counts }
    }

    pub fn counts(&self) -> &[u64; BINS] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Smallest and largest populated intensity.
    pub fn range(&self) -> Option<(u8, u8)> {
        let min = self.counts.iter().position(|&c| c > 0)?;
        let max = self.counts.iter().rposition(|&c| c > 0)?;
        Some((min as u8, max as u8))
    }
}

/// Threshold `t` maximising the between-class variance of `{<= t}` vs `{> t}`.
///
/// When several consecutive thresholds share the maximum (the empty bins between
/// two populated ones), the middle of the first such run is returned. An empty
/// histogram yields 0 and a single populated intensity yields that intensity.
pub fn otsu_threshold(histogram: &Histogram) -> u8 {
    let Some((min_v, max_v)) = histogram.range() else {
        warn!("empty histogram, falling back to threshold 0");
        return 0;
    };
    if min_v == max_v {
        warn!("uniform volume with intensity {min_v}, using it as threshold");
        return min_v;
    }

    let counts = histogram.counts();
    let total = histogram.total() as f64;
    let sum_total: f64 = counts
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_first = min_v as usize;
    let mut best_last = min_v as usize;

    for (t, &count) in counts.iter().enumerate().take(max_v as usize) {
        w_b += count as f64;
        sum_b += t as f64 * count as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;

        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;
        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);

        let tolerance = best_var.abs() * 1e-12;
        if var_between > best_var + tolerance {
            best_var = var_between;
            best_first = t;
            best_last = t;
        } else if (var_between - best_var).abs() <= tolerance && best_last + 1 == t {
            best_last = t;
        }
    }

    let threshold = ((best_first + best_last) / 2) as u8;
    debug!(
        "otsu: range {min_v}..={max_v}, maximal run {best_first}..={best_last}, threshold {threshold}"
    );
    threshold
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThresholdParams {
    /// Written for samples at or below the threshold.
    pub inside_value: u8,
    /// Written for samples above the threshold.
    pub outside_value: u8,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            inside_value: 0,
            outside_value: 255,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdResult {
    pub threshold: u8,
    pub output: Volume,
}

#[derive(Clone, Debug, Default)]
pub struct OtsuThresholdFilter {
    params: ThresholdParams,
}

impl OtsuThresholdFilter {
    pub fn new(params: ThresholdParams) -> Self {
        Self { params }
    }

    pub fn apply(&self, volume: &Volume) -> ThresholdResult {
        let histogram = Histogram::from_volume(volume);
        let threshold = otsu_threshold(&histogram);
        let ThresholdParams {
            inside_value,
            outside_value,
        } = self.params;

        let mut data = volume.data().clone();
        data.par_mapv_inplace(|v| {
            if v <= threshold {
                inside_value
            } else {
                outside_value
            }
        });

        ThresholdResult {
            threshold,
            output: volume.with_data(data),
        }
    }
}
