//! Run configuration and its validation.
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{DEFAULT_DAYS, MAX_DAYS};
use crate::rng::wrap_seed;
use crate::segment::{Segment, parse_segment_value};

/// Errors raised when a run configuration is unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    ZeroCount { field: &'static str },
    #[error("days must be at most {max} (got {days})")]
    DaysOutOfRange { days: u32, max: u32 },
    #[error("play probability must be within [0, 1] (got {value})")]
    ProbabilityOutOfRange { value: f64 },
    #[error("segment table is empty")]
    EmptySegmentTable,
    #[error("segment #{index} has no name")]
    UnnamedSegment { index: usize },
    #[error("segment {name}: {field} must be a finite non-negative number (got {value})")]
    InvalidSegmentValue {
        name: String,
        field: &'static str,
        value: f64,
    },
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parameters of one simulation run. Immutable while the run executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "SimulationConfig::default_users")]
    pub users: usize,
    #[serde(default = "SimulationConfig::default_sessions_per_day", alias = "sessionsPerDay")]
    pub sessions_per_day: u32,
    #[serde(default = "SimulationConfig::default_rolls_per_session", alias = "rollsPerSession")]
    pub rolls_per_session: u32,
    #[serde(default = "SimulationConfig::default_p_play", alias = "pPlay")]
    pub p_play: f64,
    /// Only consulted when no segment table is supplied.
    #[serde(default, alias = "explodeSix")]
    pub explode_six: bool,
    /// Any integer is accepted in documents and wrapped into 32 bits.
    #[serde(
        default = "SimulationConfig::default_seed",
        deserialize_with = "deserialize_seed"
    )]
    pub seed: u32,
    #[serde(default = "SimulationConfig::default_days")]
    pub days: u32,
    #[serde(
        default,
        alias = "segmentData",
        deserialize_with = "deserialize_segments",
        skip_serializing_if = "Option::is_none"
    )]
    pub segments: Option<Vec<Segment>>,
}

impl SimulationConfig {
    #[must_use]
    pub const fn default_users() -> usize {
        1_000
    }

    #[must_use]
    pub const fn default_sessions_per_day() -> u32 {
        2
    }

    #[must_use]
    pub const fn default_rolls_per_session() -> u32 {
        2
    }

    #[must_use]
    pub const fn default_p_play() -> f64 {
        1.0
    }

    #[must_use]
    pub const fn default_seed() -> u32 {
        crate::rng::DEFAULT_SEED
    }

    #[must_use]
    pub const fn default_days() -> u32 {
        DEFAULT_DAYS
    }

    /// Parse a configuration document, applying defaults for absent fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the configuration is invalid.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[must_use]
    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = Some(segments);
        self
    }

    /// True when users are split across an explicit segment table.
    #[must_use]
    pub const fn is_segmented(&self) -> bool {
        self.segments.is_some()
    }

    /// Check every invariant a run relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.users == 0 {
            return Err(ConfigError::ZeroCount { field: "users" });
        }
        if self.days == 0 {
            return Err(ConfigError::ZeroCount { field: "days" });
        }
        if self.days > MAX_DAYS {
            return Err(ConfigError::DaysOutOfRange {
                days: self.days,
                max: MAX_DAYS,
            });
        }
        if self.sessions_per_day == 0 {
            return Err(ConfigError::ZeroCount {
                field: "sessions_per_day",
            });
        }
        if self.rolls_per_session == 0 {
            return Err(ConfigError::ZeroCount {
                field: "rolls_per_session",
            });
        }
        if !(0.0..=1.0).contains(&self.p_play) {
            return Err(ConfigError::ProbabilityOutOfRange { value: self.p_play });
        }
        if let Some(segments) = &self.segments {
            validate_segments(segments)?;
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            users: Self::default_users(),
            sessions_per_day: Self::default_sessions_per_day(),
            rolls_per_session: Self::default_rolls_per_session(),
            p_play: Self::default_p_play(),
            explode_six: false,
            seed: Self::default_seed(),
            days: Self::default_days(),
            segments: None,
        }
    }
}

fn validate_segments(segments: &[Segment]) -> Result<(), ConfigError> {
    if segments.is_empty() {
        return Err(ConfigError::EmptySegmentTable);
    }
    for (index, segment) in segments.iter().enumerate() {
        if segment.name.trim().is_empty() {
            return Err(ConfigError::UnnamedSegment { index });
        }
        for (field, value) in [
            ("percent", segment.percent),
            ("prize_cost", segment.prize_cost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidSegmentValue {
                    name: segment.name.clone(),
                    field,
                    value,
                });
            }
        }
    }
    Ok(())
}

fn deserialize_seed<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct SeedVisitor;

    impl Visitor<'_> for SeedVisitor {
        type Value = u32;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer seed")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<u32, E> {
            Ok(wrap_seed(i128::from(value)))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<u32, E> {
            Ok(wrap_seed(i128::from(value)))
        }

        fn visit_i128<E: de::Error>(self, value: i128) -> Result<u32, E> {
            Ok(wrap_seed(value))
        }
    }

    deserializer.deserialize_any(SeedVisitor)
}

fn deserialize_segments<'de, D>(deserializer: D) -> Result<Option<Vec<Segment>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => parse_segment_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
