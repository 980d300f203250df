//! Centralized tuning constants for the trackroll simulation.
//!
//! These values define the deterministic math for the core simulation.

// Run shape ----------------------------------------------------------------
pub const DEFAULT_DAYS: u32 = 30;
/// Longest run a configuration may request (ten years of days).
pub const MAX_DAYS: u32 = 3_650;
pub const MILESTONE_DAYS: [u32; 4] = [7, 14, 21, 30];
pub const STANDARD_SEGMENT: &str = "Standard";

// Dice ---------------------------------------------------------------------
pub const DIE_FACES: u32 = 6;
/// Upper bound on extra dice in one explosion chain; `(1/6)^10_000` is never observed.
pub const MAX_EXPLOSION_CHAIN: u32 = 10_000;
pub const ITEM_FIND_CHANCE: f64 = 0.05;
pub const ITEM_SPLIT_CHANCE: f64 = 0.5;

// Board --------------------------------------------------------------------
pub const PRIZE_POSITIONS: [u64; 9] = [10, 25, 40, 50, 60, 70, 80, 90, 100];

// Schedule -----------------------------------------------------------------
pub const SIM_START: &str = "2024-01-01T08:00:00";
pub const SESSION_SPACING_HOURS: f64 = 4.0;
pub const SESSION_JITTER_HOURS: f64 = 2.0;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Histogram ----------------------------------------------------------------
pub const HISTOGRAM_BUCKETS: usize = 40;
pub const HISTOGRAM_MAX_TICKS: f64 = 8.0;
pub const HISTOGRAM_SMALL_RANGE: f64 = 1_000.0;
pub const HISTOGRAM_SMALL_STEPS: [u64; 6] = [10, 20, 50, 100, 200, 500];
pub const HISTOGRAM_SMALL_FALLBACK: u64 = 500;
pub const HISTOGRAM_LARGE_STEPS: [u64; 9] = [
    100, 200, 500, 1_000, 2_000, 5_000, 10_000, 20_000, 50_000,
];
