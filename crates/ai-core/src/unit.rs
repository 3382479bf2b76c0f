use core::fmt::Debug;
use core::hash::Hash;

/// Stable handle for a simulated unit.
///
/// Handles are plain values: holding one never keeps the unit alive. Consumers must
/// re-check liveness through their world before dereferencing.
///
/// Deterministic simulation requires:
/// - stable ordering (`Ord`)
/// - a stable numeric ID (`stable_id`) for seeding and logs
pub trait UnitId: Copy + Ord + Eq + Hash + Debug {
    fn stable_id(self) -> u64;
}

impl UnitId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl UnitId for u32 {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

impl UnitId for usize {
    fn stable_id(self) -> u64 {
        self as u64
    }
}
