//! Minimal motion master: one active generator per unit, plus one suspended beneath it.

use std::collections::BTreeMap;

use ai_core::{TickContext, UnitId};

use crate::{GeneratorFlags, MotionGenerator, MotionWorld, MovementGenerator};

/// Owns the active generator of each unit and drives its lifecycle.
///
/// The driver holds the generator's base unit state on the owner while it runs and
/// finalizes every generator exactly once, either when it asks to be removed or when it
/// is replaced. [`MotionDriver::interrupt`] deactivates the running generator instead;
/// it is reset and resumes once the interrupting one is gone.
#[derive(Debug)]
pub struct MotionDriver<U: UnitId> {
    active: BTreeMap<U, MotionGenerator<U>>,
    suspended: BTreeMap<U, MotionGenerator<U>>,
}

impl<U: UnitId> Default for MotionDriver<U> {
    fn default() -> Self {
        Self {
            active: BTreeMap::new(),
            suspended: BTreeMap::new(),
        }
    }
}

impl<U: UnitId> MotionDriver<U> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever `unit` was doing with `generator`.
    pub fn start<W: MotionWorld<Unit = U>>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        unit: U,
        generator: impl Into<MotionGenerator<U>>,
    ) {
        self.stop(world, unit);
        let mut generator = generator.into();
        tracing::debug!(unit = unit.stable_id(), kind = ?generator.kind(), "starting generator");
        world.add_unit_state(unit, generator.base_unit_state());
        generator.initialize(ctx, unit, world);
        self.active.insert(unit, generator);
    }

    /// Run `generator` on top of what `unit` is doing.
    ///
    /// The running generator is deactivated and kept; it is reset on the first update
    /// after `generator` ends. An older suspended generator is finalized.
    pub fn interrupt<W: MotionWorld<Unit = U>>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        unit: U,
        generator: impl Into<MotionGenerator<U>>,
    ) {
        if let Some(mut current) = self.active.remove(&unit) {
            tracing::debug!(
                unit = unit.stable_id(),
                kind = ?current.kind(),
                "suspending generator"
            );
            current.deactivate(unit, world);
            world.clear_unit_state(unit, current.base_unit_state());
            if let Some(mut older) = self.suspended.insert(unit, current) {
                older.finalize(unit, world, false, false);
            }
        }
        self.start(ctx, world, unit, generator);
    }

    /// Drop `unit`'s active generator without informing its AI. A suspended generator
    /// resumes on the next update.
    pub fn stop<W: MotionWorld<Unit = U>>(
        &mut self,
        world: &mut W,
        unit: U,
    ) -> Option<MotionGenerator<U>> {
        let mut generator = self.active.remove(&unit)?;
        generator.finalize(unit, world, true, false);
        world.clear_unit_state(unit, generator.base_unit_state());
        Some(generator)
    }

    /// Drop both the active and the suspended generator of `unit`.
    pub fn clear<W: MotionWorld<Unit = U>>(&mut self, world: &mut W, unit: U) {
        self.stop(world, unit);
        if let Some(mut suspended) = self.suspended.remove(&unit) {
            suspended.finalize(unit, world, false, false);
        }
    }

    pub fn pause(&mut self, unit: U, timer_ms: u32) {
        if let Some(generator) = self.active.get_mut(&unit) {
            generator.pause(timer_ms);
        }
    }

    pub fn resume(&mut self, unit: U, override_timer_ms: u32) {
        if let Some(generator) = self.active.get_mut(&unit) {
            generator.resume(override_timer_ms);
        }
    }

    /// Relaunch in-flight movement of `unit` at its new speed on the next update.
    pub fn unit_speed_changed(&mut self, unit: U) {
        if let Some(generator) = self.active.get_mut(&unit) {
            generator.unit_speed_changed();
        }
    }

    pub fn suspended(&self, unit: U) -> Option<&MotionGenerator<U>> {
        self.suspended.get(&unit)
    }

    pub fn get(&self, unit: U) -> Option<&MotionGenerator<U>> {
        self.active.get(&unit)
    }

    pub fn get_mut(&mut self, unit: U) -> Option<&mut MotionGenerator<U>> {
        self.active.get_mut(&unit)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Update every active generator once. Returns the units whose generator finished.
    pub fn update<W: MotionWorld<Unit = U>>(&mut self, ctx: &TickContext, world: &mut W) -> Vec<U> {
        let idle: Vec<U> = self
            .suspended
            .keys()
            .filter(|unit| !self.active.contains_key(unit))
            .copied()
            .collect();
        for unit in idle {
            if let Some(mut generator) = self.suspended.remove(&unit) {
                tracing::debug!(
                    unit = unit.stable_id(),
                    kind = ?generator.kind(),
                    "resuming generator"
                );
                world.add_unit_state(unit, generator.base_unit_state());
                generator.reset(ctx, unit, world);
                self.active.insert(unit, generator);
            }
        }

        let mut finished = Vec::new();
        for (&unit, generator) in self.active.iter_mut() {
            if generator.has_flag(GeneratorFlags::INITIALIZATION_PENDING) {
                generator.initialize(ctx, unit, world);
            }
            if !generator.update(ctx, unit, world) {
                finished.push(unit);
            }
        }

        for &unit in &finished {
            if let Some(mut generator) = self.active.remove(&unit) {
                tracing::debug!(
                    unit = unit.stable_id(),
                    kind = ?generator.kind(),
                    "generator finished"
                );
                generator.finalize(unit, world, true, true);
                world.clear_unit_state(unit, generator.base_unit_state());
            }
        }
        finished
    }
}
