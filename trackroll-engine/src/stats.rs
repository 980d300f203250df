//! Population statistics at milestone days and prize cost aggregation.
use serde::{Deserialize, Serialize};

use crate::numbers::{floor_f64_to_usize, u64_to_f64, usize_to_f64};
use crate::segment::{Segment, UserState};

/// Mean and sample standard deviation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanStd {
    pub mean: f64,
    pub std: f64,
}

/// Five-number summary using linear interpolation between order statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quantiles {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Snapshot of the population's positions on one milestone day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    /// One-based day number.
    pub day: u32,
    pub users: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl DayStats {
    #[must_use]
    pub fn from_values(day: u32, values: &[f64]) -> Self {
        let MeanStd { mean, std } = mean_std(values);
        let Quantiles {
            min,
            q1,
            median,
            q3,
            max,
        } = quantiles(values);
        Self {
            day,
            users: values.len(),
            mean,
            std,
            min,
            q1,
            median,
            q3,
            max,
        }
    }
}

/// Whole-run prize cost for one segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCost {
    pub segment: String,
    pub users: usize,
    pub total_cost: f64,
}

impl SegmentCost {
    /// Average cost per member; zero for an empty segment.
    #[must_use]
    pub fn average_cost(&self) -> f64 {
        self.total_cost / usize_to_f64(self.users.max(1))
    }
}

/// Mean and Bessel-corrected standard deviation. A single value has zero spread.
#[must_use]
pub fn mean_std(values: &[f64]) -> MeanStd {
    let n = usize_to_f64(values.len().max(1));
    let mean = values.iter().sum::<f64>() / n;
    let squared: f64 = values.iter().map(|x| (x - mean) * (x - mean)).sum();
    let variance = squared / usize_to_f64(values.len().saturating_sub(1).max(1));
    MeanStd {
        mean,
        std: variance.sqrt(),
    }
}

/// Min, quartiles and max. An empty slice yields all zeros.
#[must_use]
pub fn quantiles(values: &[f64]) -> Quantiles {
    if values.is_empty() {
        return Quantiles::default();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Quantiles {
        min: sorted[0],
        q1: interpolate(&sorted, 0.25),
        median: interpolate(&sorted, 0.5),
        q3: interpolate(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    }
}

fn interpolate(sorted: &[f64], p: f64) -> f64 {
    let idx = usize_to_f64(sorted.len() - 1) * p;
    let lo = idx.floor();
    let hi = idx.ceil();
    let lo_value = sorted[floor_f64_to_usize(lo)];
    if (hi - lo).abs() < f64::EPSILON {
        return lo_value;
    }
    let hi_value = sorted[floor_f64_to_usize(hi)];
    let weight = idx - lo;
    lo_value * (1.0 - weight) + hi_value * weight
}

/// Positions as floats for the statistics routines.
#[must_use]
pub fn positions_as_f64(positions: &[u64]) -> Vec<f64> {
    positions.iter().copied().map(u64_to_f64).collect()
}

/// Statistics of every user's position on `day`.
#[must_use]
pub fn milestone_stats(positions: &[u64], day: u32) -> DayStats {
    DayStats::from_values(day, &positions_as_f64(positions))
}

/// Sum member count and accumulated cost per segment name, in order of first appearance.
#[must_use]
pub fn segment_costs(users: &[UserState], segments: &[Segment]) -> Vec<SegmentCost> {
    let mut costs: Vec<SegmentCost> = Vec::new();
    for user in users {
        let Some(segment) = segments.get(user.segment) else {
            continue;
        };
        if let Some(entry) = costs.iter_mut().find(|c| c.segment == segment.name) {
            entry.users += 1;
            entry.total_cost += user.accumulated_cost;
        } else {
            costs.push(SegmentCost {
                segment: segment.name.clone(),
                users: 1,
                total_cost: user.accumulated_cost,
            });
        }
    }
    costs
}

/// Grand total across segments, labelled `TOTAL`.
#[must_use]
pub fn total_cost(costs: &[SegmentCost]) -> SegmentCost {
    SegmentCost {
        segment: "TOTAL".to_string(),
        users: costs.iter().map(|c| c.users).sum(),
        total_cost: costs.iter().map(|c| c.total_cost).sum(),
    }
}
