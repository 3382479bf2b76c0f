use ai_core::{Position, TickContext, UnitId};

use crate::{
    move_to, GeneratorFlags, MotionWorld, MovementGenerator, MovementGeneratorType, SplineAnimation,
    UnitState, WaypointMoveType,
};

/// Moves a group member to its slot next to the leader's destination.
#[derive(Debug, Clone)]
pub struct FormationMovementGenerator {
    flags: GeneratorFlags,
    id: u32,
    destination: Position,
    move_type: WaypointMoveType,
    run: bool,
    face_destination: bool,
}

impl FormationMovementGenerator {
    pub fn new(
        id: u32,
        destination: Position,
        move_type: WaypointMoveType,
        run: bool,
        face_destination: bool,
    ) -> Self {
        Self {
            flags: GeneratorFlags::INITIALIZATION_PENDING,
            id,
            destination,
            move_type,
            run,
            face_destination,
        }
    }

    fn launch<W: MotionWorld>(&self, owner: W::Unit, world: &mut W) {
        world.add_unit_state(owner, UnitState::ROAMING_MOVE);
        let mut init = move_to(world, owner, self.destination.pos, true, false);
        if self.face_destination {
            init = init.face_angle(self.destination.orientation);
        }
        init = match self.move_type {
            WaypointMoveType::Land => init.animation(SplineAnimation::ToGround),
            WaypointMoveType::TakeOff => init.animation(SplineAnimation::ToFly),
            WaypointMoveType::Walk | WaypointMoveType::Run => init,
        };
        if self.run {
            init = init.walk(false);
        }
        world.launch_spline(owner, init);
    }
}

impl<U: UnitId> MovementGenerator<U> for FormationMovementGenerator {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Formation
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
        self.flags.remove(GeneratorFlags::INITIALIZATION_PENDING | GeneratorFlags::DEACTIVATED);
        self.flags.insert(GeneratorFlags::INITIALIZED);

        if world.is_immobilized(owner) {
            self.flags.insert(GeneratorFlags::INTERRUPTED);
            world.stop_moving(owner);
            return;
        }
        self.launch(owner, world);
    }

    fn reset<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W) {
        self.flags.remove(GeneratorFlags::DEACTIVATED);
        self.initialize(ctx, owner, world);
    }

    fn update<W: MotionWorld<Unit = U>>(
        &mut self,
        _ctx: &TickContext,
        owner: U,
        world: &mut W,
    ) -> bool {
        if world.is_immobilized(owner) {
            self.flags.insert(GeneratorFlags::INTERRUPTED);
            world.stop_moving(owner);
            return true;
        }

        let finalized = world.is_spline_finalized(owner);
        if (self.flags.contains(GeneratorFlags::INTERRUPTED) && finalized)
            || (self.flags.contains(GeneratorFlags::SPEED_UPDATE_PENDING) && !finalized)
        {
            self.flags.remove(GeneratorFlags::TRANSITORY);
            self.launch(owner, world);
        }
        !world.is_spline_finalized(owner)
    }

    fn deactivate<W: MotionWorld<Unit = U>>(&mut self, owner: U, world: &mut W) {
        self.flags.insert(GeneratorFlags::DEACTIVATED);
        world.clear_unit_state(owner, UnitState::ROAMING_MOVE);
    }

    fn finalize<W: MotionWorld<Unit = U>>(
        &mut self,
        owner: U,
        world: &mut W,
        _active: bool,
        movement_inform: bool,
    ) {
        self.flags.insert(GeneratorFlags::FINALIZED);
        world.clear_unit_state(owner, UnitState::ROAMING | UnitState::ROAMING_MOVE);
        if movement_inform && world.is_spline_finalized(owner) {
            world.movement_inform(owner, MovementGeneratorType::Formation, self.id);
        }
    }
}
