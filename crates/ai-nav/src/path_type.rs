use bitflags::bitflags;

bitflags! {
    /// Classification of a generated path.
    ///
    /// Anything other than a clean `NORMAL` is degraded; callers branch on these bits
    /// instead of handling errors.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PathType: u16 {
        /// Path found successfully.
        const NORMAL            = 0x0001;
        /// Travel straight from start to end, the mesh was bypassed.
        const SHORTCUT          = 0x0002;
        /// The destination is not reached exactly.
        const INCOMPLETE        = 0x0004;
        /// No usable route.
        const NOPATH            = 0x0008;
        /// Flying, swimming or mesh-less movement; points were not pathfound.
        const NOT_USING_PATH    = 0x0010;
        /// The point-count limit was hit.
        const SHORT             = 0x0020;
        const FARFROMPOLY_START = 0x0040;
        const FARFROMPOLY_END   = 0x0080;
        const FARFROMPOLY       = Self::FARFROMPOLY_START.bits() | Self::FARFROMPOLY_END.bits();
    }
}

impl PathType {
    /// Nothing computed yet.
    pub const BLANK: Self = Self::empty();

    pub fn is_clean(self) -> bool {
        self == Self::NORMAL
    }
}
