//! Displayed dice result
//!
//! Drawn from its own RNG stream. It has no link to the die's resting face,
//! and the d20 is rolled with the same cube as the d6.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceResult {
    pub d6: u8,
    pub d20: u8,
}

#[derive(Debug, Clone)]
pub struct ResultGenerator {
    rng: Pcg32,
}

impl ResultGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn roll(&mut self) -> DiceResult {
        DiceResult {
            d6: self.rng.random_range(1..=6),
            d20: self.rng.random_range(1..=20),
        }
    }
}
