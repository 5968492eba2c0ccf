//! Rejection sampling of source fluxes and positions.
//!
//! All randomness flows through a caller-owned [`RngCore`]; nothing in this module keeps
//! global state, so a fixed seed reproduces every draw.
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod poisson;
pub mod rejection;
pub mod weights;

pub use poisson::sample_poisson;
pub use rejection::{
    sample_flux, sample_flux_with_stats, sample_position, sample_position_with_stats,
    FluxSampler,
};
pub use weights::WeightTable;

/// Counters describing how a rejection loop performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RejectionStats {
    /// Candidates proposed.
    pub attempts: u64,
    /// Candidates accepted.
    pub accepted: u64,
    /// Candidates where the target exceeded the envelope height.
    pub domination_violations: u64,
}

impl RejectionStats {
    /// Fraction of proposals that were accepted, or `None` before the first attempt.
    pub fn acceptance_rate(&self) -> Option<f64> {
        if self.attempts == 0 {
            None
        } else {
            Some(self.accepted as f64 / self.attempts as f64)
        }
    }

    /// Adds the counters of `other` to `self`.
    pub fn merge(&mut self, other: &RejectionStats) {
        self.attempts += other.attempts;
        self.accepted += other.accepted;
        self.domination_violations += other.domination_violations;
    }
}

/// Generate a random float in the range [0, 1) with 53 bits of precision.
#[inline]
pub(crate) fn rand01(rng: &mut dyn RngCore) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Uniform index in `0..n`. `n` must be non-zero.
#[inline]
pub(crate) fn pick_index(rng: &mut dyn RngCore, n: usize) -> usize {
    debug_assert!(n > 0);
    ((rand01(rng) * n as f64) as usize).min(n - 1)
}
