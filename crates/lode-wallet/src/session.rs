//! Per-session randomization seeds.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest seed value, matching the 31-bit generator state.
const MAX_SEED: u32 = i32::MAX as u32;

/// Seeds for input ordering and change-address choice.
///
/// Pinned values (from configuration) survive regeneration; unpinned ones
/// are drawn fresh from the thread RNG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSeeds {
    pub input_seed: u32,
    pub change_seed: u32,
    #[serde(skip)]
    pinned_input: Option<u32>,
    #[serde(skip)]
    pinned_change: Option<u32>,
}

impl SessionSeeds {
    /// Fresh seeds, honoring any pinned value.
    pub fn new(pinned_input: Option<u32>, pinned_change: Option<u32>) -> Self {
        let mut seeds = Self {
            input_seed: 0,
            change_seed: 0,
            pinned_input,
            pinned_change,
        };
        seeds.regenerate();
        seeds
    }

    /// Both seeds fixed, e.g. for reproducing a plan.
    pub fn fixed(input_seed: u32, change_seed: u32) -> Self {
        Self::new(Some(input_seed), Some(change_seed))
    }

    /// Draw new values for every seed that is not pinned.
    pub fn regenerate(&mut self) {
        let mut rng = rand::thread_rng();
        self.input_seed = self.pinned_input.unwrap_or_else(|| rng.gen_range(0..MAX_SEED));
        self.change_seed = self.pinned_change.unwrap_or_else(|| rng.gen_range(0..MAX_SEED));
    }
}
