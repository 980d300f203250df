//! Behavioural segments, user assignment and per-user state.
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SimulationConfig};
use crate::constants::{PRIZE_POSITIONS, STANDARD_SEGMENT};
use crate::numbers::{floor_f64_to_usize, usize_to_f64};

/// Named behavioural cohort with its own roll, explosion and prize parameters.
///
/// Absent fields default to: no extra rolls, no explosion, zero prize cost,
/// zero share of the population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default, alias = "label")]
    pub name: String,
    /// Added to the global rolls-per-session.
    #[serde(default, alias = "extraRolls")]
    pub extra_rolls: u32,
    #[serde(default)]
    pub explode: bool,
    /// Charged each time a member lands exactly on a prize position.
    #[serde(default, alias = "prizeCost")]
    pub prize_cost: f64,
    /// Share of the population, in percent.
    #[serde(default)]
    pub percent: f64,
}

impl Segment {
    #[must_use]
    pub fn new(name: impl Into<String>, percent: f64) -> Self {
        Self {
            name: name.into(),
            extra_rolls: 0,
            explode: false,
            prize_cost: 0.0,
            percent,
        }
    }

    /// Implicit segment used when no table is configured.
    #[must_use]
    pub fn standard(explode: bool) -> Self {
        Self {
            explode,
            ..Self::new(STANDARD_SEGMENT, 100.0)
        }
    }

    #[must_use]
    pub const fn with_extra_rolls(mut self, extra_rolls: u32) -> Self {
        self.extra_rolls = extra_rolls;
        self
    }

    #[must_use]
    pub const fn with_explode(mut self, explode: bool) -> Self {
        self.explode = explode;
        self
    }

    #[must_use]
    pub const fn with_prize_cost(mut self, prize_cost: f64) -> Self {
        self.prize_cost = prize_cost;
        self
    }

    /// Dice rolled per session by members of this segment.
    #[must_use]
    pub const fn rolls_per_session(&self, base: u32) -> u32 {
        base.saturating_add(self.extra_rolls)
    }
}

/// Parse a segment table given either as an ordered list or as an object
/// keyed by segment id (the key doubles as the name when no label is set).
///
/// # Errors
///
/// Returns an error if the JSON is malformed or has the wrong shape.
pub fn parse_segment_table(json: &str) -> Result<Vec<Segment>, ConfigError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    parse_segment_value(value)
}

pub(crate) fn parse_segment_value(value: serde_json::Value) -> Result<Vec<Segment>, ConfigError> {
    match value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .map(|(key, entry)| -> Result<Segment, ConfigError> {
                let mut segment: Segment = serde_json::from_value(entry)?;
                if segment.name.trim().is_empty() {
                    segment.name = key;
                }
                Ok(segment)
            })
            .collect(),
        other => Ok(serde_json::from_value(other)?),
    }
}

/// Resolve the segment table a run will use.
#[must_use]
pub fn resolve_segments(config: &SimulationConfig) -> Vec<Segment> {
    config
        .segments
        .clone()
        .unwrap_or_else(|| vec![Segment::standard(config.explode_six)])
}

/// Assign every user index to a segment index.
///
/// Segments take `floor(users * percent / 100)` consecutive users in declared
/// order; users left over from rounding join the last segment. No randomness
/// is involved, so membership is identical across seeds.
#[must_use]
pub fn assign_segments(users: usize, segments: &[Segment]) -> Vec<usize> {
    let Some(last) = segments.len().checked_sub(1) else {
        return Vec::new();
    };
    let declared: f64 = segments.iter().map(|s| s.percent).sum();
    if declared > 100.0 {
        log::warn!("segment shares sum to {declared}%; later segments are truncated");
    }
    let mut assignment = Vec::with_capacity(users);
    for (index, segment) in segments.iter().enumerate() {
        let quota = floor_f64_to_usize(usize_to_f64(users) * (segment.percent / 100.0));
        let take = quota.min(users - assignment.len());
        assignment.extend(std::iter::repeat_n(index, take));
    }
    let leftover = users - assignment.len();
    if leftover > 0 {
        log::debug!(
            "assigning {leftover} leftover users to segment {}",
            segments[last].name
        );
    }
    assignment.resize(users, last);
    assignment
}

/// Mutable per-user progress for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    pub position: u64,
    pub accumulated_cost: f64,
    /// Index into the run's segment table.
    pub segment: usize,
}

impl UserState {
    #[must_use]
    pub const fn new(segment: usize) -> Self {
        Self {
            position: 0,
            accumulated_cost: 0.0,
            segment,
        }
    }

    /// Move forward by `steps` and charge the prize cost when a played
    /// session ends exactly on a prize position. Passing over a prize
    /// position without stopping on it never triggers.
    ///
    /// Returns whether a prize triggered.
    pub fn advance(&mut self, steps: u64, played: bool, prize_cost: f64) -> bool {
        self.position += steps;
        let triggered = played && is_prize_position(self.position);
        if triggered {
            self.accumulated_cost += prize_cost;
        }
        triggered
    }
}

/// Whether a board position carries a prize.
#[must_use]
pub fn is_prize_position(position: u64) -> bool {
    PRIZE_POSITIONS.contains(&position)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(assignment: &[usize], segment: usize) -> usize {
        assignment.iter().filter(|&&s| s == segment).count()
    }

    #[test]
    fn splits_population_in_declared_order() {
        let segments = vec![Segment::new("A", 30.0), Segment::new("B", 70.0)];
        let assignment = assign_segments(100, &segments);
        assert_eq!(assignment.len(), 100);
        assert_eq!(count(&assignment, 0), 30);
        assert_eq!(count(&assignment, 1), 70);
        assert!(assignment[..30].iter().all(|&s| s == 0));
        assert!(assignment[30..].iter().all(|&s| s == 1));
    }

    #[test]
    fn rounding_leftovers_join_last_segment() {
        let segments = vec![
            Segment::new("A", 33.0),
            Segment::new("B", 33.0),
            Segment::new("C", 33.0),
        ];
        let assignment = assign_segments(10, &segments);
        assert_eq!(count(&assignment, 0), 3);
        assert_eq!(count(&assignment, 1), 3);
        assert_eq!(count(&assignment, 2), 4);
    }

    #[test]
    fn quota_uses_floating_point_share() {
        // 100 * 0.29 evaluates just below 29 in binary floating point.
        let segments = vec![Segment::new("A", 29.0), Segment::new("B", 71.0)];
        let assignment = assign_segments(100, &segments);
        assert_eq!(count(&assignment, 0), 28);
        assert_eq!(count(&assignment, 1), 72);
    }

    #[test]
    fn oversubscribed_table_is_capped_at_population() {
        let segments = vec![Segment::new("A", 80.0), Segment::new("B", 80.0)];
        let assignment = assign_segments(10, &segments);
        assert_eq!(assignment.len(), 10);
        assert_eq!(count(&assignment, 0), 8);
        assert_eq!(count(&assignment, 1), 2);
    }

    #[test]
    fn zero_percent_segments_still_receive_leftovers_when_last() {
        let segments = vec![Segment::new("A", 50.0), Segment::new("B", 0.0)];
        let assignment = assign_segments(5, &segments);
        assert_eq!(count(&assignment, 0), 2);
        assert_eq!(count(&assignment, 1), 3);
    }

    #[test]
    fn standard_segment_uses_global_explode() {
        let cfg = SimulationConfig {
            explode_six: true,
            ..SimulationConfig::default()
        };
        let segments = resolve_segments(&cfg);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].name, "Standard");
        assert!(segments[0].explode);
        assert!(segments[0].prize_cost.abs() < f64::EPSILON);
    }

    #[test]
    fn parses_list_and_keyed_tables() {
        let list = parse_segment_table(
            r#"[{"name": "F2P", "percent": 70}, {"label": "Whale", "percent": 30, "prize_cost": 5}]"#,
        )
        .unwrap();
        assert_eq!(list[1].name, "Whale");
        assert!((list[1].prize_cost - 5.0).abs() < f64::EPSILON);

        let keyed = parse_segment_table(r#"{"F2P": {"percent": 100}}"#).unwrap();
        assert_eq!(keyed[0].name, "F2P");
        assert!(parse_segment_table("42").is_err());
    }

    #[test]
    fn exact_landing_triggers_prize() {
        let mut user = UserState {
            position: 45,
            ..UserState::default()
        };
        assert!(user.advance(5, true, 5.0));
        assert_eq!(user.position, 50);
        assert!((user.accumulated_cost - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overshoot_does_not_trigger_prize() {
        let mut user = UserState {
            position: 48,
            ..UserState::default()
        };
        assert!(!user.advance(7, true, 5.0));
        assert_eq!(user.position, 55);
        assert!(user.accumulated_cost.abs() < f64::EPSILON);
    }

    #[test]
    fn skipped_session_on_prize_square_does_not_trigger() {
        let mut user = UserState {
            position: 10,
            ..UserState::default()
        };
        assert!(!user.advance(0, false, 5.0));
        assert!(user.accumulated_cost.abs() < f64::EPSILON);
    }

    #[test]
    fn repeated_landings_charge_each_time() {
        let mut user = UserState::new(0);
        user.advance(10, true, 2.5);
        user.advance(15, true, 2.5);
        user.advance(15, true, 2.5);
        assert_eq!(user.position, 40);
        assert!((user.accumulated_cost - 7.5).abs() < f64::EPSILON);
    }
}
