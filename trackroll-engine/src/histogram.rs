//! Histogram binning with a human-friendly axis.
//!
//! Renderers receive bucket counts, tick positions and both maxima so they
//! can draw bars without repeating any of the binning math.
use serde::{Deserialize, Serialize};

use crate::constants::{
    HISTOGRAM_BUCKETS, HISTOGRAM_LARGE_STEPS, HISTOGRAM_MAX_TICKS, HISTOGRAM_SMALL_FALLBACK,
    HISTOGRAM_SMALL_RANGE, HISTOGRAM_SMALL_STEPS,
};
use crate::numbers::{floor_f64_to_usize, u64_to_f64, usize_to_f64};

/// Step and visible extent of the value axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisScale {
    pub step: f64,
    pub axis_max: f64,
}

impl AxisScale {
    /// Pick the smallest preferred step giving at most eight intervals and
    /// round the axis up to a whole number of steps.
    ///
    /// All-zero data keeps one step of visible axis.
    #[must_use]
    pub fn for_max(data_max: f64) -> Self {
        let step = nice_step(data_max);
        let axis_max = (data_max / step).ceil() * step;
        let axis_max = if axis_max > 0.0 { axis_max } else { step };
        Self { step, axis_max }
    }

    /// Tick values at every step multiple from zero through the axis maximum.
    #[must_use]
    pub fn ticks(&self) -> Vec<f64> {
        let count = floor_f64_to_usize((self.axis_max / self.step).round());
        (0..=count).map(|i| usize_to_f64(i) * self.step).collect()
    }
}

fn nice_step(data_max: f64) -> f64 {
    let fits = |step: &&u64| data_max / u64_to_f64(**step) <= HISTOGRAM_MAX_TICKS;
    if data_max < HISTOGRAM_SMALL_RANGE {
        let step = HISTOGRAM_SMALL_STEPS
            .iter()
            .find(fits)
            .copied()
            .unwrap_or(HISTOGRAM_SMALL_FALLBACK);
        return u64_to_f64(step);
    }
    HISTOGRAM_LARGE_STEPS
        .iter()
        .find(fits)
        .map_or_else(|| 10_f64.powf(data_max.log10().floor()), |step| u64_to_f64(*step))
}

/// Fixed-resolution histogram over `[0, axis_max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub buckets: Vec<usize>,
    pub ticks: Vec<f64>,
    pub step: f64,
    pub data_max: f64,
    pub axis_max: f64,
}

impl Histogram {
    /// Degenerate histogram: zero counts, no ticks, zero maxima.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            buckets: vec![0; HISTOGRAM_BUCKETS],
            ticks: Vec::new(),
            step: 0.0,
            data_max: 0.0,
            axis_max: 0.0,
        }
    }

    /// Bin `values` into [`HISTOGRAM_BUCKETS`] equal-width buckets.
    ///
    /// Empty input, or input containing a non-finite value, yields
    /// [`Histogram::empty`].
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            if !values.is_empty() {
                log::warn!("histogram input contains non-finite values; returning empty bins");
            }
            return Self::empty();
        }
        let data_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let scale = AxisScale::for_max(data_max);
        let mut buckets = vec![0; HISTOGRAM_BUCKETS];
        let last = HISTOGRAM_BUCKETS - 1;
        for &value in values {
            let raw = value / scale.axis_max * usize_to_f64(HISTOGRAM_BUCKETS);
            buckets[floor_f64_to_usize(raw).min(last)] += 1;
        }
        Self {
            buckets,
            ticks: scale.ticks(),
            step: scale.step,
            data_max,
            axis_max: scale.axis_max,
        }
    }

    #[must_use]
    pub fn from_positions(positions: &[u64]) -> Self {
        let values: Vec<f64> = positions.iter().copied().map(u64_to_f64).collect();
        Self::from_values(&values)
    }

    /// Tallest bucket, at least one so renderers can divide by it.
    #[must_use]
    pub fn max_count(&self) -> usize {
        self.buckets.iter().copied().max().unwrap_or(0).max(1)
    }

    /// Number of values binned.
    #[must_use]
    pub fn total(&self) -> usize {
        self.buckets.iter().sum()
    }

    /// Lower and upper bound of bucket `index`.
    #[must_use]
    pub fn bucket_bounds(&self, index: usize) -> (f64, f64) {
        let width = self.axis_max / usize_to_f64(self.buckets.len().max(1));
        let lower = usize_to_f64(index) * width;
        (lower, lower + width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_ranges_use_tens_first() {
        let scale = AxisScale::for_max(73.0);
        assert!((scale.step - 10.0).abs() < f64::EPSILON);
        assert!((scale.axis_max - 80.0).abs() < f64::EPSILON);
        assert_eq!(scale.ticks().len(), 9);
    }

    #[test]
    fn small_ranges_widen_step_until_eight_intervals() {
        let scale = AxisScale::for_max(473.0);
        assert!((scale.step - 100.0).abs() < f64::EPSILON);
        assert!((scale.axis_max - 500.0).abs() < f64::EPSILON);
        assert_eq!(scale.ticks(), vec![0.0, 100.0, 200.0, 300.0, 400.0, 500.0]);
    }

    #[test]
    fn large_ranges_use_hundreds_and_up() {
        let scale = AxisScale::for_max(1_250.0);
        assert!((scale.step - 200.0).abs() < f64::EPSILON);
        assert!((scale.axis_max - 1_400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn huge_ranges_fall_back_to_order_of_magnitude() {
        let scale = AxisScale::for_max(750_000.0);
        assert!((scale.step - 100_000.0).abs() < f64::EPSILON);
        assert!((scale.axis_max - 800_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn exact_multiple_keeps_axis_at_data_max() {
        let scale = AxisScale::for_max(80.0);
        assert!((scale.axis_max - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn counts_sum_to_input_length() {
        let values: Vec<f64> = (0..1_000).map(|v| f64::from(v) * 0.37).collect();
        let hist = Histogram::from_values(&values);
        assert_eq!(hist.buckets.len(), 40);
        assert_eq!(hist.total(), values.len());
    }

    #[test]
    fn maximum_value_is_clamped_into_last_bucket() {
        let hist = Histogram::from_values(&[0.0, 40.0, 80.0]);
        assert_eq!(hist.buckets[0], 1);
        assert_eq!(hist.buckets[20], 1);
        assert_eq!(hist.buckets[39], 1);
    }

    #[test]
    fn empty_and_non_finite_inputs_are_degenerate() {
        assert_eq!(Histogram::from_values(&[]), Histogram::empty());
        assert_eq!(
            Histogram::from_values(&[1.0, f64::NAN]),
            Histogram::empty()
        );
        assert_eq!(Histogram::empty().max_count(), 1);
    }

    #[test]
    fn all_zero_data_lands_in_first_bucket() {
        let hist = Histogram::from_positions(&[0, 0, 0]);
        assert_eq!(hist.buckets[0], 3);
        assert!((hist.axis_max - 10.0).abs() < f64::EPSILON);
        assert_eq!(hist.ticks, vec![0.0, 10.0]);
    }

    #[test]
    fn bucket_bounds_partition_axis() {
        let hist = Histogram::from_positions(&[10, 400]);
        let (lo, hi) = hist.bucket_bounds(39);
        assert!((hi - hist.axis_max).abs() < 1e-9);
        assert!(lo < hi);
    }
}
