//! Deterministic random number generation for the autoplay simulator.
//!
//! RULE: the engine itself is never random. Only simulated collaborators
//! (story progress, player choices) roll dice, and they do it through
//! `LabRng` streams derived from a single seed.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// One seeded RNG stream.
pub struct LabRng {
    inner: Pcg64Mcg,
}

impl LabRng {
    /// Derive a stream from the master seed and a stable stream index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stream: RngStream) -> Self {
        let derived_seed = master_seed ^ (stream as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll an index in [0, n). Returns 0 when n is 0.
    pub fn next_index(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        (self.inner.next_u64() % n as u64) as usize
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Stable stream assignments. Append only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngStream {
    /// Story chapters completing.
    Story = 0,
    /// Which affordable upgrade the simulated player buys.
    Player = 1,
}
