//! Concrete movement strategies.

mod chase;
mod confused;
mod distract;
mod flee;
mod flight_path;
mod follow;
mod formation;
mod generic;
mod home;
mod idle;
mod point;
mod random;
mod rotate;
mod spline_chain;
mod waypoint;

pub use chase::{ChaseAngle, ChaseMovementGenerator, ChaseRange};
pub use confused::ConfusedMovementGenerator;
pub use distract::DistractMovementGenerator;
pub use flee::{choose_flee_offset, FleeingMovementGenerator};
pub use flight_path::FlightPathMovementGenerator;
pub use follow::FollowMovementGenerator;
pub use formation::FormationMovementGenerator;
pub use generic::GenericMovementGenerator;
pub use home::HomeMovementGenerator;
pub use idle::IdleMovementGenerator;
pub use point::PointMovementGenerator;
pub use random::{RandomMoveKind, RandomMovementGenerator};
pub use rotate::{RotateDirection, RotateMovementGenerator};
pub use spline_chain::SplineChainMovementGenerator;
pub use waypoint::{WaypointMovementGenerator, WaypointState};

use ai_core::{TickContext, UnitId, Vec3, TAU};
use ai_nav::PathGenerator;

use crate::{GeneratorFlags, MotionMode, MotionPriority, MotionWorld, MovementGenerator};
use crate::{MovementGeneratorType, UnitPathAgent, UnitState};

/// RNG streams, one per randomized strategy, so draws never alias across strategies.
pub(crate) mod stream {
    pub const RANDOM: u64 = 1;
    pub const WAYPOINT: u64 = 2;
    pub const FLEE: u64 = 3;
    pub const CONFUSED: u64 = 4;
}

/// Fresh path generator for `owner` using the world's path config.
pub(crate) fn new_path<W: MotionWorld>(world: &W, owner: W::Unit) -> PathGenerator {
    let agent = UnitPathAgent::new(world, owner);
    PathGenerator::with_config(&agent, world.motion_config().path)
}

pub(crate) fn calculate_path<W: MotionWorld>(
    world: &W,
    owner: W::Unit,
    path: &mut PathGenerator,
    dest: Vec3,
    force_destination: bool,
) -> bool {
    let agent = UnitPathAgent::new(world, owner);
    path.calculate_path(&agent, world.nav_mesh(), dest, force_destination)
}

/// A spot `distance` beyond the touching distance of `target` and `searcher`, along
/// `abs_angle` from the target.
///
/// When the spot is out of sight of the target the other seven octants are tried and the
/// first visible one wins; if none is visible the original spot is kept.
pub(crate) fn near_point<W: MotionWorld>(
    world: &W,
    searcher: W::Unit,
    target: W::Unit,
    distance: f32,
    abs_angle: f32,
) -> Vec3 {
    let center = world.position(target).pos;
    let reach = world.combat_reach(target) + world.combat_reach(searcher);
    let spot = |angle: f32| {
        let mut p = center.offset_polar(reach + distance, angle);
        if let Some(h) = world.ground_height(p) {
            p.z = h;
        }
        p
    };

    let first = spot(abs_angle);
    if world.is_within_los(center, first) {
        return first;
    }
    for k in 1..8 {
        let p = spot(abs_angle + k as f32 * TAU / 8.0);
        if world.is_within_los(center, p) {
            return p;
        }
    }
    first
}

/// Every movement strategy, as one value the stack manager can store.
#[derive(Debug)]
pub enum MotionGenerator<U> {
    Idle(IdleMovementGenerator),
    Point(PointMovementGenerator<U>),
    Random(RandomMovementGenerator),
    Waypoint(WaypointMovementGenerator),
    Chase(ChaseMovementGenerator<U>),
    Follow(FollowMovementGenerator<U>),
    Fleeing(FleeingMovementGenerator<U>),
    Confused(ConfusedMovementGenerator),
    SplineChain(SplineChainMovementGenerator),
    Formation(FormationMovementGenerator),
    Home(HomeMovementGenerator),
    Rotate(RotateMovementGenerator),
    Distract(DistractMovementGenerator),
    FlightPath(FlightPathMovementGenerator),
    Generic(GenericMovementGenerator<U>),
}

macro_rules! dispatch {
    ($self:expr, $g:ident => $body:expr) => {
        match $self {
            MotionGenerator::Idle($g) => $body,
            MotionGenerator::Point($g) => $body,
            MotionGenerator::Random($g) => $body,
            MotionGenerator::Waypoint($g) => $body,
            MotionGenerator::Chase($g) => $body,
            MotionGenerator::Follow($g) => $body,
            MotionGenerator::Fleeing($g) => $body,
            MotionGenerator::Confused($g) => $body,
            MotionGenerator::SplineChain($g) => $body,
            MotionGenerator::Formation($g) => $body,
            MotionGenerator::Home($g) => $body,
            MotionGenerator::Rotate($g) => $body,
            MotionGenerator::Distract($g) => $body,
            MotionGenerator::FlightPath($g) => $body,
            MotionGenerator::Generic($g) => $body,
        }
    };
}

macro_rules! impl_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl<U: UnitId> From<$ty> for MotionGenerator<U> {
                fn from(g: $ty) -> Self {
                    MotionGenerator::$variant(g)
                }
            }
        )*
    };
}

impl_from!(
    Idle(IdleMovementGenerator),
    Point(PointMovementGenerator<U>),
    Random(RandomMovementGenerator),
    Waypoint(WaypointMovementGenerator),
    Chase(ChaseMovementGenerator<U>),
    Follow(FollowMovementGenerator<U>),
    Fleeing(FleeingMovementGenerator<U>),
    Confused(ConfusedMovementGenerator),
    SplineChain(SplineChainMovementGenerator),
    Formation(FormationMovementGenerator),
    Home(HomeMovementGenerator),
    Rotate(RotateMovementGenerator),
    Distract(DistractMovementGenerator),
    FlightPath(FlightPathMovementGenerator),
    Generic(GenericMovementGenerator<U>),
);

impl<U: UnitId> MovementGenerator<U> for MotionGenerator<U> {
    fn kind(&self) -> MovementGeneratorType {
        dispatch!(self, g => MovementGenerator::<U>::kind(g))
    }

    fn mode(&self) -> MotionMode {
        dispatch!(self, g => MovementGenerator::<U>::mode(g))
    }

    fn priority(&self) -> MotionPriority {
        dispatch!(self, g => MovementGenerator::<U>::priority(g))
    }

    fn flags(&self) -> GeneratorFlags {
        dispatch!(self, g => MovementGenerator::<U>::flags(g))
    }

    fn flags_mut(&mut self) -> &mut GeneratorFlags {
        dispatch!(self, g => MovementGenerator::<U>::flags_mut(g))
    }

    fn base_unit_state(&self) -> UnitState {
        dispatch!(self, g => MovementGenerator::<U>::base_unit_state(g))
    }

    fn initialize<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W) {
        dispatch!(self, g => g.initialize(ctx, owner, world))
    }

    fn reset<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W) {
        dispatch!(self, g => g.reset(ctx, owner, world))
    }

    fn update<W: MotionWorld<Unit = U>>(
        &mut self,
        ctx: &TickContext,
        owner: U,
        world: &mut W,
    ) -> bool {
        dispatch!(self, g => g.update(ctx, owner, world))
    }

    fn deactivate<W: MotionWorld<Unit = U>>(&mut self, owner: U, world: &mut W) {
        dispatch!(self, g => g.deactivate(owner, world))
    }

    fn finalize<W: MotionWorld<Unit = U>>(
        &mut self,
        owner: U,
        world: &mut W,
        active: bool,
        movement_inform: bool,
    ) {
        if self.is_finalized() {
            tracing::trace!(kind = ?self.kind(), "generator already finalized");
            return;
        }
        dispatch!(self, g => g.finalize(owner, world, active, movement_inform))
    }

    fn unit_speed_changed(&mut self) {
        dispatch!(self, g => MovementGenerator::<U>::unit_speed_changed(g))
    }

    fn pause(&mut self, timer_ms: u32) {
        dispatch!(self, g => MovementGenerator::<U>::pause(g, timer_ms))
    }

    fn resume(&mut self, override_timer_ms: u32) {
        dispatch!(self, g => MovementGenerator::<U>::resume(g, override_timer_ms))
    }

    fn reset_position<W: MotionWorld<Unit = U>>(&self, owner: U, world: &W) -> Option<Vec3> {
        dispatch!(self, g => g.reset_position(owner, world))
    }
}
