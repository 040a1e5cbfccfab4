//! Packed handles of referenced components.

use serde::{Deserialize, Serialize};

/// A Pod-compatible handle to a component in a
/// [`ReferencedComponentRegistry`](super::ReferencedComponentRegistry).
///
/// Layout: bits `0..24` hold the slot index, bits `24..32` the slot
/// version. A handle is valid while its version matches the slot's
/// current version. Index 0 is reserved, so [`NONE`](Self::NONE) never
/// resolves.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ComponentReference(u32);

impl ComponentReference {
    /// The null reference.
    pub const NONE: Self = Self(0);
    /// Number of bits used by the slot index.
    pub const INDEX_BITS: u32 = 24;
    /// Largest representable slot index.
    pub const MAX_INDEX: u32 = (1 << Self::INDEX_BITS) - 1;

    /// Packs an index and a version. Index bits above
    /// [`INDEX_BITS`](Self::INDEX_BITS) are dropped.
    pub const fn new(index: u32, version: u8) -> Self {
        Self((index & Self::MAX_INDEX) | ((version as u32) << Self::INDEX_BITS))
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> u32 {
        self.0 & Self::MAX_INDEX
    }

    pub const fn version(self) -> u8 {
        (self.0 >> Self::INDEX_BITS) as u8
    }

    /// Returns `true` if the index is 0. Such a reference never resolves.
    pub const fn is_none(self) -> bool {
        self.index() == 0
    }
}

impl std::fmt::Display for ComponentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.index(), self.version())
    }
}
