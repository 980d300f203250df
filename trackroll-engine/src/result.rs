//! Completed runs and the read-only views reports are built from.
use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use twox_hash::XxHash64;

use crate::config::{ConfigError, SimulationConfig};
use crate::histogram::Histogram;
use crate::segment::{Segment, UserState};
use crate::simulation::{DaySessions, milestone_days, simulate};
use crate::stats::{DayStats, SegmentCost, milestone_stats, segment_costs};

/// Failed lookups against a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("user {user_id} is out of range (valid: 1..={users})")]
    UserOutOfRange { user_id: usize, users: usize },
    #[error("no simulation has been run yet")]
    NoRun,
}

/// One row of the final standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    /// One-based user id.
    pub user_id: usize,
    pub segment: String,
    pub position: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub config: SimulationConfig,
    pub segments: Vec<Segment>,
    /// Final state per user, indexed by zero-based user index.
    pub users: Vec<UserState>,
    /// `positions[user][day]`: position at the end of each day.
    pub positions: Vec<Vec<u64>>,
    /// `history[user][day]`: the sessions that user had on that day.
    pub history: Vec<Vec<DaySessions>>,
    pub segment_costs: Vec<SegmentCost>,
    pub milestones: Vec<DayStats>,
}

impl SimulationResult {
    /// Assemble a result and derive its cost totals and milestone statistics.
    #[must_use]
    pub fn new(
        config: SimulationConfig,
        segments: Vec<Segment>,
        users: Vec<UserState>,
        positions: Vec<Vec<u64>>,
        history: Vec<Vec<DaySessions>>,
    ) -> Self {
        let segment_costs = segment_costs(&users, &segments);
        let mut result = Self {
            config,
            segments,
            users,
            positions,
            history,
            segment_costs,
            milestones: Vec::new(),
        };
        result.milestones = milestone_days(result.config.days)
            .into_iter()
            .filter_map(|day| {
                result
                    .positions_on_day(day)
                    .map(|column| milestone_stats(&column, day))
            })
            .collect();
        result
    }

    /// Every user's position at the end of one-based `day`.
    #[must_use]
    pub fn positions_on_day(&self, day: u32) -> Option<Vec<u64>> {
        let index = usize::try_from(day).ok()?.checked_sub(1)?;
        self.positions
            .iter()
            .map(|row| row.get(index).copied())
            .collect()
    }

    #[must_use]
    pub fn final_positions(&self) -> Vec<u64> {
        self.users.iter().map(|u| u.position).collect()
    }

    /// Name of the segment user index `index` belongs to.
    #[must_use]
    pub fn segment_name(&self, index: usize) -> &str {
        self.users
            .get(index)
            .and_then(|u| self.segments.get(u.segment))
            .map_or("", |s| s.name.as_str())
    }

    /// Final standings, highest position first. Ties keep user-id order.
    #[must_use]
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut order: Vec<usize> = (0..self.users.len()).collect();
        order.sort_by(|&a, &b| self.users[b].position.cmp(&self.users[a].position));
        order
            .into_iter()
            .enumerate()
            .map(|(rank, index)| LeaderboardEntry {
                rank: rank + 1,
                user_id: index + 1,
                segment: self.segment_name(index).to_string(),
                position: self.users[index].position,
            })
            .collect()
    }

    /// Day-by-day sessions of one-based `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::UserOutOfRange`] outside `1..=users`.
    pub fn user_history(&self, user_id: usize) -> Result<&[DaySessions], LookupError> {
        user_id
            .checked_sub(1)
            .and_then(|index| self.history.get(index))
            .map(Vec::as_slice)
            .ok_or(LookupError::UserOutOfRange {
                user_id,
                users: self.history.len(),
            })
    }

    /// Position histogram for one-based `day`.
    #[must_use]
    pub fn histogram_for_day(&self, day: u32) -> Option<Histogram> {
        self.positions_on_day(day)
            .map(|column| Histogram::from_positions(&column))
    }

    /// xxHash64 digest of the position matrix and accumulated costs.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        for row in &self.positions {
            for &position in row {
                hasher.write_u64(position);
            }
        }
        for user in &self.users {
            hasher.write_u64(user.accumulated_cost.to_bits());
        }
        hasher.finish()
    }
}

/// Holds a configuration and the last result produced from it.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulationConfig,
    last: Option<SimulationResult>,
}

impl Simulator {
    #[must_use]
    pub const fn new(config: SimulationConfig) -> Self {
        Self { config, last: None }
    }

    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run with the held configuration, replacing any previous result.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid; the previous result
    /// is kept in that case.
    pub fn run(&mut self) -> Result<&SimulationResult, ConfigError> {
        let result = simulate(&self.config)?;
        let stored: &SimulationResult = self.last.insert(result);
        Ok(stored)
    }

    #[must_use]
    pub const fn last(&self) -> Option<&SimulationResult> {
        self.last.as_ref()
    }

    /// Session history of one-based `user_id` from the last run.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NoRun`] before the first run and
    /// [`LookupError::UserOutOfRange`] for an unknown user.
    pub fn inspect(&self, user_id: usize) -> Result<&[DaySessions], LookupError> {
        self.last
            .as_ref()
            .ok_or(LookupError::NoRun)?
            .user_history(user_id)
    }
}
