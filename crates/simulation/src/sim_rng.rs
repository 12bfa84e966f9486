//! Deterministic simulation RNG resource.
//!
//! Wraps `ChaCha8Rng` so that a run with the same inputs and seed converts
//! exactly the same cells on every platform. Every random draw of the engine
//! (seed selection, seed challenge, patch sizes, compactness, candidate
//! acceptance) goes through this resource.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::DEFAULT_SEED;

#[derive(Resource)]
pub struct SimRng(pub ChaCha8Rng);

impl Default for SimRng {
    fn default() -> Self {
        Self(ChaCha8Rng::seed_from_u64(DEFAULT_SEED))
    }
}

impl SimRng {
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}
