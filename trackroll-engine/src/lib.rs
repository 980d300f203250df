//! Trackroll Simulation Engine
//!
//! Deterministic multi-day simulation of a population moving along a dice
//! track. Every draw comes from one seeded Mulberry32 stream, so a seed and a
//! configuration reproduce a run bit for bit.
//! This crate has no I/O; callers supply configuration documents through
//! [`ConfigSource`].

pub mod config;
pub mod constants;
pub mod dice;
pub mod histogram;
pub mod numbers;
pub mod result;
pub mod rng;
pub mod schedule;
pub mod segment;
pub mod simulation;
pub mod stats;

// Re-export commonly used types
pub use config::{ConfigError, SimulationConfig};
pub use dice::{ItemFind, roll_die, roll_item, roll_session};
pub use histogram::{AxisScale, Histogram};
pub use result::{LeaderboardEntry, LookupError, SimulationResult, Simulator};
pub use rng::{DEFAULT_SEED, Mulberry32, wrap_seed};
pub use schedule::{SessionClock, format_timestamp};
pub use segment::{Segment, UserState, assign_segments, parse_segment_table};
pub use simulation::{
    DaySessions, SessionRecord, SimulationError, milestone_days, simulate, simulate_with_cancel,
};
pub use stats::{DayStats, MeanStd, Quantiles, SegmentCost, mean_std, quantiles, total_cost};

/// Trait for abstracting where configuration documents come from.
/// Front ends provide the implementation (files, embedded fixtures, ...).
pub trait ConfigSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Return the raw JSON document called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read.
    fn read_document(&self, name: &str) -> Result<String, Self::Error>;
}

/// Failure to load a document through a [`ConfigSource`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError<E>
where
    E: std::error::Error + 'static,
{
    #[error("failed to read {name}")]
    Source {
        name: String,
        #[source]
        source: E,
    },
    #[error("{name} is not a valid document")]
    Invalid {
        name: String,
        #[source]
        source: ConfigError,
    },
}

/// Load and validate a full run configuration.
///
/// # Errors
///
/// Returns an error if the document cannot be read, parsed or validated.
pub fn load_config<S: ConfigSource>(
    source: &S,
    name: &str,
) -> Result<SimulationConfig, LoadError<S::Error>> {
    let raw = read(source, name)?;
    SimulationConfig::from_json_str(&raw).map_err(|source| LoadError::Invalid {
        name: name.to_string(),
        source,
    })
}

/// Load a segment table given as a list or as an object keyed by segment id.
///
/// # Errors
///
/// Returns an error if the document cannot be read or parsed.
pub fn load_segments<S: ConfigSource>(
    source: &S,
    name: &str,
) -> Result<Vec<Segment>, LoadError<S::Error>> {
    let raw = read(source, name)?;
    parse_segment_table(&raw).map_err(|source| LoadError::Invalid {
        name: name.to_string(),
        source,
    })
}

fn read<S: ConfigSource>(source: &S, name: &str) -> Result<String, LoadError<S::Error>> {
    log::debug!("loading {name}");
    source
        .read_document(name)
        .map_err(|err| LoadError::Source {
            name: name.to_string(),
            source: err,
        })
}
