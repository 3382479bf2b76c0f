//! Who is chasing or following whom.

use std::collections::{BTreeMap, BTreeSet};

use ai_core::UnitId;

use crate::MotionWorld;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FollowKind {
    Chase,
    Follow,
}

/// Two-way index of targeted generators.
///
/// Each follower has at most one target. Removing a unit drops it from both sides so no
/// stale handle survives it.
#[derive(Debug, Clone)]
pub struct FollowerRegistry<U: UnitId> {
    targets: BTreeMap<U, (U, FollowKind)>,
    followers: BTreeMap<U, BTreeSet<U>>,
}

impl<U: UnitId> Default for FollowerRegistry<U> {
    fn default() -> Self {
        Self { targets: BTreeMap::new(), followers: BTreeMap::new() }
    }
}

impl<U: UnitId> FollowerRegistry<U> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, follower: U, target: U, kind: FollowKind) {
        self.unregister(follower);
        self.targets.insert(follower, (target, kind));
        self.followers.entry(target).or_default().insert(follower);
    }

    pub fn unregister(&mut self, follower: U) {
        let Some((target, _)) = self.targets.remove(&follower) else {
            return;
        };
        if let Some(set) = self.followers.get_mut(&target) {
            set.remove(&follower);
            if set.is_empty() {
                self.followers.remove(&target);
            }
        }
    }

    pub fn target_of(&self, follower: U) -> Option<(U, FollowKind)> {
        self.targets.get(&follower).copied()
    }

    /// Followers of `target`, in handle order.
    pub fn followers_of(&self, target: U) -> impl Iterator<Item = U> + '_ {
        self.followers.get(&target).into_iter().flat_map(|set| set.iter().copied())
    }

    /// True when `a` is currently chasing `b`.
    pub fn is_chasing(&self, a: U, b: U) -> bool {
        self.targets.get(&a) == Some(&(b, FollowKind::Chase))
    }

    pub fn remove_unit(&mut self, unit: U) {
        self.unregister(unit);
        if let Some(set) = self.followers.remove(&unit) {
            for follower in set {
                self.targets.remove(&follower);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Non-owning reference to a target unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRef<U> {
    unit: U,
}

impl<U: UnitId> TargetRef<U> {
    pub fn new(unit: U) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> U {
        self.unit
    }

    /// The target, if it is still in the world.
    pub fn resolve<W: MotionWorld<Unit = U>>(&self, world: &W) -> Option<U> {
        world.is_in_world(self.unit).then_some(self.unit)
    }
}
