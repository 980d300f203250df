//! The day × user × session loop.
//!
//! One generator is threaded through every draw in a fixed order: days, then
//! users, then sessions. Within a session the jitter draw comes first, then
//! the play draw, then (for played sessions only) the dice and the item
//! check. Reordering any of these changes every downstream value.
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::config::{ConfigError, SimulationConfig};
use crate::constants::MILESTONE_DAYS;
use crate::dice::{ItemFind, roll_item, roll_session};
use crate::result::SimulationResult;
use crate::rng::Mulberry32;
use crate::schedule::SessionClock;
use crate::segment::{UserState, assign_segments, resolve_segments};

/// Audit record of one scheduled session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// One-based day number.
    pub day: u32,
    /// Zero-based session index within the day.
    pub session: u32,
    pub timestamp: NaiveDateTime,
    pub played: bool,
    pub start_position: u64,
    pub steps_gained: u64,
    pub end_position: u64,
    pub item: Option<ItemFind>,
    pub prize_triggered: bool,
}

/// Sessions of one user on one day.
pub type DaySessions = SmallVec<[SessionRecord; 4]>;

/// Reasons a run can stop without a result.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("simulation cancelled on day {day}")]
    Cancelled { day: u32 },
}

/// Milestone days that fall within a run of `days` days.
#[must_use]
pub fn milestone_days(days: u32) -> Vec<u32> {
    MILESTONE_DAYS.iter().copied().filter(|&d| d <= days).collect()
}

/// Run a full simulation.
///
/// # Errors
///
/// Returns an error if the configuration fails validation.
pub fn simulate(config: &SimulationConfig) -> Result<SimulationResult, ConfigError> {
    config.validate()?;
    execute(config, |_| Ok::<(), ConfigError>(()))
}

/// Run a simulation that stops early once `cancel` is set.
///
/// The flag is polled before each user's day; a cancelled run returns no
/// partial result.
///
/// # Errors
///
/// Returns [`SimulationError::Config`] for an invalid configuration and
/// [`SimulationError::Cancelled`] when the flag was raised.
pub fn simulate_with_cancel(
    config: &SimulationConfig,
    cancel: &AtomicBool,
) -> Result<SimulationResult, SimulationError> {
    config.validate()?;
    execute(config, |day| {
        if cancel.load(Ordering::Relaxed) {
            Err(SimulationError::Cancelled { day })
        } else {
            Ok(())
        }
    })
}

fn execute<E>(
    config: &SimulationConfig,
    mut checkpoint: impl FnMut(u32) -> Result<(), E>,
) -> Result<SimulationResult, E> {
    let segments = resolve_segments(config);
    let mut users: Vec<UserState> = assign_segments(config.users, &segments)
        .into_iter()
        .map(UserState::new)
        .collect();
    log::debug!(
        "simulating {} users over {} days with {} segment(s), seed {}",
        config.users,
        config.days,
        segments.len(),
        config.seed
    );

    let mut positions: Vec<Vec<u64>> = vec![Vec::new(); users.len()];
    let mut history: Vec<Vec<DaySessions>> = vec![Vec::new(); users.len()];
    let mut rng = Mulberry32::new(config.seed);
    let clock = SessionClock::default();

    for day in 0..config.days {
        for (index, user) in users.iter_mut().enumerate() {
            checkpoint(day + 1)?;
            let segment = &segments[user.segment];
            let rolls = segment.rolls_per_session(config.rolls_per_session);
            let mut sessions = DaySessions::new();
            for session in 0..config.sessions_per_day {
                let timestamp = clock.session_time(day, session, rng.next_f64());
                let played = rng.chance(config.p_play);
                let start_position = user.position;
                let (steps_gained, item) = if played {
                    let steps = roll_session(&mut rng, rolls, segment.explode);
                    (steps, roll_item(&mut rng))
                } else {
                    (0, None)
                };
                let prize_triggered = user.advance(steps_gained, played, segment.prize_cost);
                sessions.push(SessionRecord {
                    day: day + 1,
                    session,
                    timestamp,
                    played,
                    start_position,
                    steps_gained,
                    end_position: user.position,
                    item,
                    prize_triggered,
                });
            }
            positions[index].push(user.position);
            history[index].push(sessions);
        }
        log::trace!("day {} complete", day + 1);
    }

    log::info!(
        "simulation finished: {} users, {} days, {} draws",
        config.users,
        config.days,
        rng.draws()
    );
    Ok(SimulationResult::new(
        config.clone(),
        segments,
        users,
        positions,
        history,
    ))
}
