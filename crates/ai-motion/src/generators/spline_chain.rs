use std::sync::Arc;

use ai_core::{TickContext, UnitId, Vec3};

use crate::{
    GeneratorFlags, MotionWorld, MoveSplineInit, MovementGenerator, MovementGeneratorType,
    SplineChainLink, SplineChainResumeInfo, UnitState,
};

/// Plays an authored sequence of splines on a fixed schedule.
///
/// Each link launches `time_to_next_ms` after the previous one. When a link runs longer
/// or shorter than it was authored, the wait for the next link stretches by the same
/// ratio.
#[derive(Debug, Clone)]
pub struct SplineChainMovementGenerator {
    flags: GeneratorFlags,
    id: u32,
    chain: Arc<[SplineChainLink]>,
    walk: bool,
    next_index: usize,
    next_first_point: usize,
    ms_to_next: u32,
}

impl SplineChainMovementGenerator {
    pub fn new(id: u32, chain: Arc<[SplineChainLink]>, walk: bool) -> Self {
        Self {
            flags: GeneratorFlags::INITIALIZATION_PENDING,
            id,
            chain,
            walk,
            next_index: 0,
            next_first_point: 0,
            ms_to_next: 0,
        }
    }

    /// Continue a chain captured with [`Self::resume_info`]. `None` for empty info.
    pub fn resume(info: &SplineChainResumeInfo) -> Option<Self> {
        let chain = info.chain.clone()?;
        let mut generator = Self::new(info.point_id, chain, info.walk);
        generator.next_index = info.spline_index;
        generator.next_first_point = info.point_index;
        generator.ms_to_next = info.time_to_next_ms;
        if info.spline_index >= generator.chain.len() {
            generator.flags.insert(GeneratorFlags::FINALIZED);
        }
        Some(generator)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    fn send_path_spline<W: MotionWorld>(
        &self,
        owner: W::Unit,
        world: &mut W,
        velocity: f32,
        path: &[Vec3],
    ) -> u32 {
        let mut init = MoveSplineInit::new().move_by_path(path.to_vec()).walk(self.walk);
        if velocity > 0.0 {
            init = init.velocity(velocity);
        }
        world.launch_spline(owner, init)
    }

    /// Launch link `index` and stretch `ms_to_next` by its actual/expected duration.
    fn send_spline_for<W: MotionWorld>(&mut self, owner: W::Unit, world: &mut W, index: usize) {
        let link = &self.chain[index];
        let actual = self.send_path_spline(owner, world, link.velocity, &link.points);
        if actual != link.expected_duration_ms {
            let scaled = f64::from(actual) / f64::from(link.expected_duration_ms)
                * f64::from(self.ms_to_next);
            tracing::debug!(
                unit = ?owner,
                chain = self.id,
                index,
                actual,
                expected = link.expected_duration_ms,
                "spline chain link drifted from its authored duration"
            );
            self.ms_to_next = scaled as u32;
        }
    }

    /// Snapshot from which [`Self::resume`] can pick the chain back up.
    pub fn resume_info<W: MotionWorld>(&self, owner: W::Unit, world: &W) -> SplineChainResumeInfo {
        let info = |spline_index: usize, point_index: usize, time_to_next_ms: u32| {
            SplineChainResumeInfo {
                point_id: self.id,
                chain: Some(self.chain.clone()),
                walk: self.walk,
                spline_index,
                point_index,
                time_to_next_ms,
            }
        };
        if self.next_index == 0 {
            return info(0, 0, self.ms_to_next);
        }
        if world.is_spline_finalized(owner) {
            if self.next_index < self.chain.len() {
                return info(self.next_index, 0, 1);
            }
            return SplineChainResumeInfo::default();
        }
        let passed = world.spline_current_index(owner).max(0) as usize;
        info(self.next_index - 1, passed + 1, self.ms_to_next)
    }
}

impl<U: UnitId> MovementGenerator<U> for SplineChainMovementGenerator {
    fn kind(&self) -> MovementGeneratorType {
        MovementGeneratorType::SplineChain
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

        if self.chain.is_empty() {
            tracing::error!(unit = ?owner, chain = self.id, "spline chain is empty");
            return;
        }
        if self.next_index >= self.chain.len() {
            tracing::warn!(
                unit = ?owner,
                chain = self.id,
                index = self.next_index,
                "spline chain already complete"
            );
            self.ms_to_next = 0;
            return;
        }

        if self.next_first_point > 0 {
            if self.flags.contains(GeneratorFlags::FINALIZED) {
                return;
            }
            let link = &self.chain[self.next_index];
            if self.next_first_point >= link.points.len() {
                tracing::error!(
                    unit = ?owner,
                    chain = self.id,
                    index = self.next_index,
                    point = self.next_first_point,
                    "invalid spline chain resume point"
                );
                self.next_first_point = link.points.len() - 1;
            }
            world.add_unit_state(owner, UnitState::ROAMING_MOVE);
            let partial = &link.points[self.next_first_point - 1..];
            self.send_path_spline(owner, world, link.velocity, partial);
            tracing::debug!(unit = ?owner, chain = self.id, "resumed spline chain");

            self.next_index += 1;
            if self.next_index >= self.chain.len() {
                self.ms_to_next = 0;
            } else if self.ms_to_next == 0 {
                self.ms_to_next = 1;
            }
            self.next_first_point = 0;
        } else {
            world.add_unit_state(owner, UnitState::ROAMING_MOVE);
            self.ms_to_next = self.chain[self.next_index].time_to_next_ms.max(1);
            self.send_spline_for(owner, world, self.next_index);
            self.next_index += 1;
            if self.next_index >= self.chain.len() {
                self.ms_to_next = 0;
            }
        }
    }

    fn reset<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, owner: U, world: &mut W) {
        self.flags.remove(GeneratorFlags::DEACTIVATED);
        world.stop_moving(owner);
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
        if self.chain.is_empty() {
            return true;
        }

        // zero means the final link is running
        if self.ms_to_next == 0 {
            if world.is_spline_finalized(owner) {
                self.flags.insert(GeneratorFlags::INFORM_ENABLED);
                return false;
            }
            return true;
        }

        if self.ms_to_next <= ctx.diff_ms {
            self.ms_to_next = self.chain[self.next_index].time_to_next_ms.max(1);
            self.send_spline_for(owner, world, self.next_index);
            self.next_index += 1;
            if self.next_index >= self.chain.len() {
                self.ms_to_next = 0;
            }
        } else {
            self.ms_to_next -= ctx.diff_ms;
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
            world.movement_inform(owner, MovementGeneratorType::SplineChain, self.id);
        }
    }
}
