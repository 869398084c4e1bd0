//! Deterministic RNG hierarchy.
//!
//! A master seed generates sub-seeds for each `(run_id, segment_id, stream)`
//! tuple. Sub-seeds are derived via BLAKE3 hashing, independently of the
//! order in which segments are visited, so a strategy that draws random
//! numbers sees the same stream on every replay of the same segment.

use crate::domain::RunId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a sub-seed for `(run_id, segment_id, stream)`.
    pub fn sub_seed(&self, run_id: &RunId, segment_id: &str, stream: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(run_id.as_str().as_bytes());
        hasher.update(segment_id.as_bytes());
        hasher.update(&stream.to_le_bytes());
        seed_from_hash(hasher.finalize())
    }

    pub fn random_for(&self, run_id: &RunId, segment_id: &str, stream: u64) -> DeterministicRandom {
        DeterministicRandom::new(self.sub_seed(run_id, segment_id, stream))
    }
}

/// First 8 bytes of a BLAKE3 digest as a little-endian u64.
pub fn seed_from_hash(hash: blake3::Hash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Seeded random source handed to strategies through their context.
#[derive(Debug, Clone)]
pub struct DeterministicRandom {
    seed: u64,
    rng: StdRng,
}

impl DeterministicRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in `[low, high]` (inclusive). Returns `low` when the
    /// range is empty.
    pub fn randint(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    /// Uniform float in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..items.len());
        items.get(idx)
    }
}
