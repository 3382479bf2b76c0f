use ai_core::{TickContext, UnitId, Vec3};

use crate::{
    move_to, GeneratorFlags, MotionWorld, MovementGenerator, MovementGeneratorType, UnitState,
};

/// Moves to a single point and reports arrival.
#[derive(Debug, Clone)]
pub struct PointMovementGenerator<U> {
    flags: GeneratorFlags,
    id: u32,
    destination: Vec3,
    generate_path: bool,
    speed: Option<f32>,
    final_orientation: Option<f32>,
    face_target: Option<U>,
    /// Only watch a spline someone else launched.
    charge_prepath: bool,
}

impl<U: UnitId> PointMovementGenerator<U> {
    pub fn new(id: u32, destination: Vec3, generate_path: bool) -> Self {
        Self {
            flags: GeneratorFlags::INITIALIZATION_PENDING,
            id,
            destination,
            generate_path,
            speed: None,
            final_orientation: None,
            face_target: None,
            charge_prepath: false,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = (speed > 0.0).then_some(speed);
        self
    }

    pub fn with_final_orientation(mut self, orientation: f32) -> Self {
        self.final_orientation = Some(orientation);
        self
    }

    pub fn facing_unit(mut self, target: U) -> Self {
        self.face_target = Some(target);
        self
    }

    pub fn charge_prepath(mut self) -> Self {
        self.charge_prepath = true;
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn destination(&self) -> Vec3 {
        self.destination
    }

    fn launch<W: MotionWorld<Unit = U>>(&self, owner: U, world: &mut W) {
        world.add_unit_state(owner, UnitState::ROAMING_MOVE);
        let mut init = move_to(world, owner, self.destination, self.generate_path, false);
        if let Some(speed) = self.speed {
            init = init.velocity(speed);
        }
        if let Some(target) = self.face_target {
            init = init.face_unit(target);
        }
        if let Some(orientation) = self.final_orientation {
            init = init.face_angle(orientation);
        }
        world.launch_spline(owner, init);
    }
}

impl<U: UnitId> MovementGenerator<U> for PointMovementGenerator<U> {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::Point
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

        world.add_unit_state(owner, UnitState::ROAMING_MOVE);
        if self.charge_prepath {
            return;
        }
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
        if self.charge_prepath {
            if world.is_spline_finalized(owner) {
                self.flags.insert(GeneratorFlags::INFORM_ENABLED);
                return false;
            }
            return true;
        }

        if world.is_immobilized(owner) {
            self.flags.insert(GeneratorFlags::INTERRUPTED);
            world.stop_moving(owner);
            return true;
        }

        let finalized = world.is_spline_finalized(owner);
        if (self.flags.contains(GeneratorFlags::INTERRUPTED) && finalized)
            || (self.flags.contains(GeneratorFlags::SPEED_UPDATE_PENDING) && !finalized)
        {
            self.flags.remove(GeneratorFlags::INTERRUPTED | GeneratorFlags::SPEED_UPDATE_PENDING);
            self.launch(owner, world);
        }

        if world.is_spline_finalized(owner) {
            self.flags.remove(GeneratorFlags::TRANSITORY);
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
            world.clear_unit_state(owner, UnitState::ROAMING_MOVE);
        }
        if movement_inform && self.flags.contains(GeneratorFlags::INFORM_ENABLED) {
            world.movement_inform(owner, MovementGeneratorType::Point, self.id);
        }
    }
}
