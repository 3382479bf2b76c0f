use ai_core::{normalize_orientation, TickContext, UnitId, TAU};
use serde::{Deserialize, Serialize};

use crate::{GeneratorFlags, MotionWorld, MovementGenerator, MovementGeneratorType, UnitState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotateDirection {
    /// Counter-clockwise.
    Left,
    Right,
}

/// Turns in place, one full revolution per `max_duration`.
#[derive(Debug, Clone)]
pub struct RotateMovementGenerator {
    flags: GeneratorFlags,
    id: u32,
    duration: u32,
    max_duration: u32,
    direction: RotateDirection,
}

impl RotateMovementGenerator {
    pub fn new(id: u32, duration_ms: u32, direction: RotateDirection) -> Self {
        Self {
            flags: GeneratorFlags::INITIALIZATION_PENDING,
            id,
            duration: duration_ms,
            max_duration: duration_ms.max(1),
            direction,
        }
    }
}

impl<U: UnitId> MovementGenerator<U> for RotateMovementGenerator {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Rotate
    }

    fn flags(&self) -> GeneratorFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut GeneratorFlags {
        &mut self.flags
    }

    fn base_unit_state(&self) -> UnitState {
        UnitState::ROTATING
    }

    fn initialize<W: MotionWorld<Unit = U>>(
        &mut self,
        _ctx: &TickContext,
        owner: U,
        world: &mut W,
    ) {
        self.flags.remove(GeneratorFlags::INITIALIZATION_PENDING | GeneratorFlags::DEACTIVATED);
        self.flags.insert(GeneratorFlags::INITIALIZED);
        world.stop_moving(owner);
    }

    fn reset<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W) {
        self.flags.remove(GeneratorFlags::DEACTIVATED);
        self.initialize(ctx, owner, world);
    }

    fn update<W: MotionWorld<Unit = U>>(
        &mut self,
        ctx: &TickContext,
        owner: U,
        world: &mut W,
    ) -> bool {
        let step = ctx.diff_ms as f32 * TAU / self.max_duration as f32;
        let sign = match self.direction {
            RotateDirection::Left => 1.0,
            RotateDirection::Right => -1.0,
        };
        let angle = normalize_orientation(world.position(owner).orientation + step * sign);
        world.set_orientation(owner, angle);

        if self.duration > ctx.diff_ms {
            self.duration -= ctx.diff_ms;
            true
        } else {
            self.flags.insert(GeneratorFlags::INFORM_ENABLED);
            false
        }
    }

    fn deactivate<W: MotionWorld<Unit = U>>(&mut self, _owner: U, _world: &mut W) {
        self.flags.insert(GeneratorFlags::DEACTIVATED);
    }

    fn finalize<W: MotionWorld<Unit = U>>(
        &mut self,
        owner: U,
        world: &mut W,
        _active: bool,
        movement_inform: bool,
    ) {
        self.flags.insert(GeneratorFlags::FINALIZED);
        if movement_inform && self.flags.contains(GeneratorFlags::INFORM_ENABLED) {
            world.movement_inform(owner, MovementGeneratorType::Rotate, self.id);
        }
    }
}
