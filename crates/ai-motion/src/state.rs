use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Movement-related state bits carried by a unit.
    ///
    /// A generator's base state (`CHASE`, `ROAMING`, ...) is owned by whoever stacks the
    /// generators; the `*_MOVE` companions are set by the generator itself while a spline
    /// it launched is running.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct UnitState: u32 {
        const DIED = 0x0000_0001;
        const STUNNED = 0x0000_0008;
        const ROAMING = 0x0000_0010;
        const CHASE = 0x0000_0020;
        const FOCUSING = 0x0000_0040;
        const FLEEING = 0x0000_0080;
        const IN_FLIGHT = 0x0000_0100;
        const FOLLOW = 0x0000_0200;
        const ROOT = 0x0000_0400;
        const CONFUSED = 0x0000_0800;
        const DISTRACTED = 0x0000_1000;
        const EVADE = 0x0008_0000;
        const ROAMING_MOVE = 0x0010_0000;
        const CONFUSED_MOVE = 0x0020_0000;
        const FLEEING_MOVE = 0x0040_0000;
        const CHASE_MOVE = 0x0080_0000;
        const FOLLOW_MOVE = 0x0100_0000;
        const ROTATING = 0x0200_0000;
        const LOST_CONTROL = 0x0400_0000;

        const MOVING = Self::ROAMING_MOVE.bits()
            | Self::CONFUSED_MOVE.bits()
            | Self::FLEEING_MOVE.bits()
            | Self::CHASE_MOVE.bits()
            | Self::FOLLOW_MOVE.bits();
        const CONTROLLED = Self::CONFUSED.bits() | Self::STUNNED.bits() | Self::FLEEING.bits();
        const NOT_MOVE = Self::ROOT.bits()
            | Self::STUNNED.bits()
            | Self::DIED.bits()
            | Self::DISTRACTED.bits();
        /// Everything a return-home may wipe.
        const ALL_ERASABLE = Self::ROAMING.bits()
            | Self::CHASE.bits()
            | Self::FOCUSING.bits()
            | Self::FLEEING.bits()
            | Self::FOLLOW.bits()
            | Self::CONFUSED.bits()
            | Self::EVADE.bits()
            | Self::ROTATING.bits()
            | Self::MOVING.bits();
    }
}
