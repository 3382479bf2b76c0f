use ai_core::{TickContext, UnitId};
use ai_nav::PathAgent;

use crate::{
    move_to, GeneratorFlags, MotionWorld, MovementGenerator, MovementGeneratorType, UnitPathAgent,
    UnitState,
};

/// Returns the owner to its home position after combat.
#[derive(Debug, Clone)]
pub struct HomeMovementGenerator {
    flags: GeneratorFlags,
}

impl Default for HomeMovementGenerator {
    fn default() -> Self {
        Self { flags: GeneratorFlags::INITIALIZATION_PENDING }
    }
}

impl HomeMovementGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_target_location<W: MotionWorld>(&mut self, owner: W::Unit, world: &mut W) {
        // still held in place: finish on the next update rather than get stuck evading
        let held = UnitState::ROOT | UnitState::STUNNED | UnitState::DISTRACTED;
        if world.has_unit_state(owner, held) {
            self.flags.insert(GeneratorFlags::INTERRUPTED);
            return;
        }

        world.clear_unit_state(owner, UnitState::ALL_ERASABLE - UnitState::EVADE);
        world.add_unit_state(owner, UnitState::ROAMING_MOVE);

        let home = world.home_position(owner);
        let mut dest = home.pos;
        UnitPathAgent::new(world, owner).update_allowed_position_z(&mut dest);
        let init = move_to(world, owner, dest, true, false)
            .face_angle(home.orientation)
            .walk(false);
        world.launch_spline(owner, init);
    }
}

impl<U: UnitId> MovementGenerator<U> for HomeMovementGenerator {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Home
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
        self.set_target_location(owner, world);
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
        if self.flags.contains(GeneratorFlags::INTERRUPTED) || world.is_spline_finalized(owner) {
            self.flags.insert(GeneratorFlags::INFORM_ENABLED);
            return false;
        }
        true
    }

    fn deactivate<W: MotionWorld<Unit = U>>(&mut self, owner: U, world: &mut W) {
        self.flags.insert(GeneratorFlags::DEACTIVATED);
        world.clear_unit_state(owner, UnitState::ROAMING_MOVE);
    }

    fn finalize<W: MotionWorld<Unit = U>>(
        &mut self,
        owner: U,
        world: &mut W,
        active: bool,
        movement_inform: bool,
    ) {
        self.flags.insert(GeneratorFlags::FINALIZED);
        if active {
            world.clear_unit_state(owner, UnitState::ROAMING_MOVE | UnitState::EVADE);
        }
        if movement_inform && self.flags.contains(GeneratorFlags::INFORM_ENABLED) {
            world.just_reached_home(owner);
        }
    }
}
