use crate::{rng, SplitMix64, UnitId};

/// Per-step input handed to every motion update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    /// Milliseconds elapsed since the previous step.
    pub diff_ms: u32,
    pub seed: u64,
}

impl TickContext {
    pub fn new(tick: u64, diff_ms: u32, seed: u64) -> Self {
        Self {
            tick,
            diff_ms,
            seed,
        }
    }

    /// Context for the following step with the same seed.
    pub fn next(self, diff_ms: u32) -> Self {
        Self {
            tick: self.tick + 1,
            diff_ms,
            seed: self.seed,
        }
    }

    /// Generator for one unit's draws on this step. Different ticks give different draws.
    pub fn rng_for_unit<U: UnitId>(&self, unit: U, stream: u64) -> SplitMix64 {
        let seed = rng::derive_seed(self.seed ^ rng::mix64(self.tick), unit.stable_id(), stream);
        SplitMix64::new(seed)
    }
}
