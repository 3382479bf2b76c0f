use ai_core::{TickContext, UnitId};

use crate::{GeneratorFlags, MotionWorld, MovementGenerator, MovementGeneratorType, UnitState};

/// Stands still.
#[derive(Debug, Clone)]
pub struct IdleMovementGenerator {
    flags: GeneratorFlags,
}

impl Default for IdleMovementGenerator {
    fn default() -> Self {
        Self { flags: GeneratorFlags::INITIALIZED }
    }
}

impl IdleMovementGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<U: UnitId> MovementGenerator<U> for IdleMovementGenerator {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Idle
    }

    fn flags(&self) -> GeneratorFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut GeneratorFlags {
        &mut self.flags
    }

    fn base_unit_state(&self) -> UnitState {
        UnitState::empty()
    }

    fn initialize<W: MotionWorld<Unit = U>>(
        &mut self,
        _ctx: &TickContext,
        owner: U,
        world: &mut W,
    ) {
        world.stop_moving(owner);
    }

    fn reset<W: MotionWorld<Unit = U>>(&mut self, _ctx: &TickContext, owner: U, world: &mut W) {
        world.stop_moving(owner);
    }

    fn update<W: MotionWorld<Unit = U>>(
        &mut self,
        _ctx: &TickContext,
        _owner: U,
        _world: &mut W,
    ) -> bool {
        true
    }

    fn deactivate<W: MotionWorld<Unit = U>>(&mut self, _owner: U, _world: &mut W) {}

    fn finalize<W: MotionWorld<Unit = U>>(
        &mut self,
        _owner: U,
        _world: &mut W,
        _active: bool,
        _inform: bool,
    ) {
        self.flags.insert(GeneratorFlags::FINALIZED);
    }

    fn unit_speed_changed(&mut self) {}
}
