use ai_core::{TickContext, UnitId};

use crate::{
    GeneratorFlags, MotionMode, MotionPriority, MotionWorld, MovementGenerator,
    MovementGeneratorType, UnitState,
};

/// Stops and looks somewhere for a while.
#[derive(Debug, Clone)]
pub struct DistractMovementGenerator {
    flags: GeneratorFlags,
    timer: u32,
    orientation: f32,
}

impl DistractMovementGenerator {
    pub fn new(timer_ms: u32, orientation: f32) -> Self {
        Self { flags: GeneratorFlags::INITIALIZATION_PENDING, timer: timer_ms, orientation }
    }
}

impl<U: UnitId> MovementGenerator<U> for DistractMovementGenerator {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Distract
    }

    fn priority(&self) -> MotionPriority {
        MotionPriority::Highest
    }

    fn mode(&self) -> MotionMode {
        MotionMode::Controlled
    }

    fn flags(&self) -> GeneratorFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut GeneratorFlags {
        &mut self.flags
    }

    fn base_unit_state(&self) -> UnitState {
        UnitState::DISTRACTED
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
        world.set_orientation(owner, self.orientation);
    }

    fn reset<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W) {
        self.flags.remove(GeneratorFlags::DEACTIVATED);
        self.initialize(ctx, owner, world);
    }

    fn update<W: MotionWorld<Unit = U>>(
        &mut self,
        ctx: &TickContext,
        _owner: U,
        _world: &mut W,
    ) -> bool {
        if ctx.diff_ms > self.timer {
            self.flags.insert(GeneratorFlags::INFORM_ENABLED);
            return false;
        }
        self.timer -= ctx.diff_ms;
        true
    }

    fn deactivate<W: MotionWorld<Unit = U>>(&mut self, _owner: U, _world: &mut W) {
        self.flags.insert(GeneratorFlags::DEACTIVATED);
    }

    fn finalize<W: MotionWorld<Unit = U>>(
        &mut self,
        owner: U,
        world: &mut W,
        active: bool,
        _inform: bool,
    ) {
        self.flags.insert(GeneratorFlags::FINALIZED);
        world.clear_unit_state(owner, UnitState::DISTRACTED);
        if active {
            let home = world.home_position(owner);
            world.set_orientation(owner, home.orientation);
        }
    }

    fn unit_speed_changed(&mut self) {}
}
