/// Countdown timer in milliseconds.
///
/// A tracker is `passed()` once its remaining time reaches zero. `new(0)` is passed
/// immediately, which generators use to mean "act on the next update".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeTracker {
    remaining: i64,
}

impl TimeTracker {
    pub fn new(ms: u32) -> Self {
        Self {
            remaining: ms as i64,
        }
    }

    pub fn update(&mut self, diff_ms: u32) {
        self.remaining -= diff_ms as i64;
    }

    pub fn passed(&self) -> bool {
        self.remaining <= 0
    }

    pub fn reset(&mut self, ms: u32) {
        self.remaining = ms as i64;
    }

    /// Remaining time, clamped at zero.
    pub fn expiry(&self) -> u32 {
        self.remaining.clamp(0, u32::MAX as i64) as u32
    }
}
