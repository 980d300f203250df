//! Wall-clock scheduling of sessions for the audit trail.
use chrono::{Duration, NaiveDateTime};

use crate::constants::{SESSION_JITTER_HOURS, SESSION_SPACING_HOURS, SIM_START, TIMESTAMP_FORMAT};
use crate::numbers::trunc_f64_to_i64;

/// Computes session timestamps relative to the simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    start: NaiveDateTime,
}

impl SessionClock {
    #[must_use]
    pub const fn new(start: NaiveDateTime) -> Self {
        Self { start }
    }

    /// Timestamp of session `session` on zero-based day `day`.
    ///
    /// Sessions sit four hours apart with up to two hours of jitter; the
    /// offset is truncated to whole hours.
    #[must_use]
    pub fn session_time(&self, day: u32, session: u32, jitter: f64) -> NaiveDateTime {
        let offset = f64::from(session) * SESSION_SPACING_HOURS + jitter * SESSION_JITTER_HOURS;
        self.start + Duration::days(i64::from(day)) + Duration::hours(trunc_f64_to_i64(offset))
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        let start = NaiveDateTime::parse_from_str(SIM_START, "%Y-%m-%dT%H:%M:%S")
            .unwrap_or_default();
        Self::new(start)
    }
}

/// Render a timestamp the way reports and exports print it.
#[must_use]
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
