//! The movement generator contract.
//!
//! A generator is a strategy that decides where its owner goes next. It is driven by an
//! external stack manager through a fixed lifecycle:
//!
//! `initialize` → `update`* → (`deactivate` → `reset` → `update`*)* → `finalize`
//!
//! `update` returning `false` asks the manager to remove the generator; the manager then
//! calls `finalize` exactly once.

use ai_core::{TickContext, UnitId, Vec3};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{MotionWorld, UnitState};

/// Stable identifiers reported through `movement_inform` and used by the stack manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementGeneratorType {
    Idle,
    Random,
    Waypoint,
    Confused,
    Chase,
    Home,
    Flight,
    Point,
    Fleeing,
    Distract,
    TimedFleeing,
    Follow,
    Rotate,
    Effect,
    SplineChain,
    Formation,
}

impl MovementGeneratorType {
    pub const fn id(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Random => 1,
            Self::Waypoint => 2,
            Self::Confused => 4,
            Self::Chase => 5,
            Self::Home => 6,
            Self::Flight => 7,
            Self::Point => 8,
            Self::Fleeing => 9,
            Self::Distract => 10,
            Self::TimedFleeing => 13,
            Self::Follow => 14,
            Self::Rotate => 15,
            Self::Effect => 16,
            Self::SplineChain => 17,
            Self::Formation => 18,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionMode {
    #[default]
    Default,
    /// Loss-of-control movement imposed on the unit (fear, confusion, distraction).
    Controlled,
    /// Externally computed motion that replaces the unit's own plans.
    Override,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPriority {
    None,
    #[default]
    Normal,
    Highest,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GeneratorFlags: u16 {
        const INITIALIZATION_PENDING = 0x001;
        const INITIALIZED = 0x002;
        const SPEED_UPDATE_PENDING = 0x004;
        const INTERRUPTED = 0x008;
        const PAUSED = 0x010;
        const TIMED_PAUSED = 0x020;
        const DEACTIVATED = 0x040;
        const INFORM_ENABLED = 0x080;
        const FINALIZED = 0x100;
        /// Reached a node and already ran its arrival hooks.
        const INFORMED = 0x200;

        const TRANSITORY = Self::SPEED_UPDATE_PENDING.bits() | Self::INTERRUPTED.bits();
    }
}

/// A movement strategy for units of type `U`.
///
/// World access is generic per call so strategies stay free of lifetimes and can be
/// stored by value in the manager's stack.
pub trait MovementGenerator<U: UnitId> {
    fn kind(&self) -> MovementGeneratorType;

    fn mode(&self) -> MotionMode {
        MotionMode::Default
    }

    fn priority(&self) -> MotionPriority {
        MotionPriority::Normal
    }

    fn flags(&self) -> GeneratorFlags;

    fn flags_mut(&mut self) -> &mut GeneratorFlags;

    /// State bit the manager holds on the owner while this generator is on the stack.
    fn base_unit_state(&self) -> UnitState;

    fn initialize<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W);

    fn reset<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W);

    /// Advance one step. `false` means "remove me".
    fn update<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W)
        -> bool;

    fn deactivate<W: MotionWorld<Unit = U>>(&mut self, owner: U, world: &mut W);

    fn finalize<W: MotionWorld<Unit = U>>(
        &mut self,
        owner: U,
        world: &mut W,
        active: bool,
        movement_inform: bool,
    );

    fn unit_speed_changed(&mut self) {
        self.flags_mut().insert(GeneratorFlags::SPEED_UPDATE_PENDING);
    }

    /// `0` pauses until `resume`; anything else pauses for that many milliseconds.
    fn pause(&mut self, _timer_ms: u32) {}

    fn resume(&mut self, _override_timer_ms: u32) {}

    /// Where the owner should be put back if it has to be reset in place.
    fn reset_position<W: MotionWorld<Unit = U>>(&self, _owner: U, _world: &W) -> Option<Vec3> {
        None
    }

    fn has_flag(&self, flag: GeneratorFlags) -> bool {
        self.flags().intersects(flag)
    }

    fn is_finalized(&self) -> bool {
        self.flags().contains(GeneratorFlags::FINALIZED)
    }
}
