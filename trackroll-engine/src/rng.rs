//! Mulberry32 stream generator used for every draw in a simulation run.
//!
//! All arithmetic is exact 32-bit wraparound so two implementations given the
//! same seed and draw count agree to the bit. A run owns exactly one
//! generator and threads it by `&mut` through every draw site.

use rand::{RngCore, SeedableRng};

/// Seed substituted when a caller passes zero.
pub const DEFAULT_SEED: u32 = 42;

const INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Mulberry32 generator with draw instrumentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
    draws: u64,
}

impl Mulberry32 {
    /// Construct a stream from a user seed, replacing zero with [`DEFAULT_SEED`].
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        let state = if seed == 0 { DEFAULT_SEED } else { seed };
        Self { state, draws: 0 }
    }

    /// Advance the stream and return the raw 32-bit output.
    pub const fn next_raw(&mut self) -> u32 {
        self.state = self.state.wrapping_add(INCREMENT);
        self.draws = self.draws.saturating_add(1);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_raw()) / TWO_POW_32
    }

    /// Bernoulli draw: true with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Number of draws consumed since construction.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl Default for Mulberry32 {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.next_raw()
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.next_raw());
        let high = u64::from(self.next_raw());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(wrap_seed(i128::from(state)))
    }
}

/// Wrap any integer seed into the 32-bit seed space (two's complement, mod 2^32).
#[must_use]
pub const fn wrap_seed(seed: i128) -> u32 {
    (seed & 0xFFFF_FFFF) as u32
}
