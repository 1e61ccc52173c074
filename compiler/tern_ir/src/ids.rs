//! Index handles shared across crates.

use std::fmt;

/// Handle of a module admitted into a module registry.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct ModuleId(u32);

impl ModuleId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        ModuleId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a buffer registered with a `SourceMap`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(transparent)]
pub struct BufferId(u32);

impl BufferId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        BufferId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Checkpoint in the set of loaded modules.
///
/// Bumped once per successfully admitted module file. Consumers remember the
/// generation they last scanned at and ask only for newer modules.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Generation(u32);

impl Generation {
    /// Generation before any module file was admitted.
    pub const INITIAL: Generation = Generation(0);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        Generation(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The generation that follows this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}
