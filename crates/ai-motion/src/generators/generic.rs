use ai_core::{TickContext, TimeTracker, UnitId};

use crate::{
    GeneratorFlags, MotionMode, MotionWorld, MoveSplineInit, MovementGenerator,
    MovementGeneratorType, UnitState,
};

/// Runs a spline built elsewhere and supervises its duration.
#[derive(Debug, Clone)]
pub struct GenericMovementGenerator<U> {
    flags: GeneratorFlags,
    init: MoveSplineInit<U>,
    kind: MovementGeneratorType,
    id: u32,
    duration: TimeTracker,
}

impl<U: UnitId> GenericMovementGenerator<U> {
    pub fn new(init: MoveSplineInit<U>, kind: MovementGeneratorType, id: u32) -> Self {
        Self {
            flags: GeneratorFlags::INITIALIZATION_PENDING,
            init,
            kind,
            id,
            duration: TimeTracker::new(0),
        }
    }
}

impl<U: UnitId> MovementGenerator<U> for GenericMovementGenerator<U> {
    fn kind(&self) -> MovementGeneratorType {
        self.kind
    }

    fn mode(&self) -> MotionMode {
        MotionMode::Override
    }

    fn flags(&self) -> GeneratorFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut GeneratorFlags {
        &mut self.flags
    }

    fn base_unit_state(&self) -> UnitState {
        UnitState::ROAMING
    }

    fn initialize<W: MotionWorld<Unit = U>>(
        &mut self,
        _ctx: &TickContext,
        owner: U,
        world: &mut W,
    ) {
        // a deactivated spline cannot be resumed
        if self.flags.contains(GeneratorFlags::DEACTIVATED)
            && !self.flags.contains(GeneratorFlags::INITIALIZATION_PENDING)
        {
            self.flags.remove(GeneratorFlags::DEACTIVATED);
            self.flags.insert(GeneratorFlags::FINALIZED);
            return;
        }
        self.flags.remove(GeneratorFlags::INITIALIZATION_PENDING | GeneratorFlags::DEACTIVATED);
        self.flags.insert(GeneratorFlags::INITIALIZED);
        let duration = world.launch_spline(owner, self.init.clone());
        self.duration.reset(duration);
    }

    fn reset<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W) {
        self.initialize(ctx, owner, world);
    }

    fn update<W: MotionWorld<Unit = U>>(
        &mut self,
        ctx: &TickContext,
        owner: U,
        world: &mut W,
    ) -> bool {
        if self.flags.contains(GeneratorFlags::FINALIZED) {
            return false;
        }
        // cyclic splines never expire
        if !world.is_spline_cyclic(owner) {
            self.duration.update(ctx.diff_ms);
        }
        if self.duration.passed() || world.is_spline_finalized(owner) {
            self.flags.insert(GeneratorFlags::INFORM_ENABLED);
            return false;
        }
        true
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
            world.movement_inform(owner, self.kind, self.id);
        }
    }
}
