//! 32-bit string hashes used as compact identifiers.
//!
//! Type names and attribute names are stored as [`StringHash`] when the full
//! string is not needed (compact archives, type registry lookup). The hash is
//! FNV-1a over the UTF-8 bytes, with the empty string mapped to
//! [`StringHash::EMPTY`].

use serde::{Deserialize, Serialize};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// A Pod-compatible 32-bit hash of a string.
#[derive(
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
pub struct StringHash(pub u32);

impl StringHash {
    /// Hash of the empty string.
    pub const EMPTY: Self = Self(0);

    /// Hashes a string.
    pub const fn new(s: &str) -> Self {
        let bytes = s.as_bytes();
        if bytes.is_empty() {
            return Self::EMPTY;
        }

        let mut hash = FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Returns the raw hash value.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns `true` for the hash of the empty string.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<&str> for StringHash {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<&String> for StringHash {
    fn from(s: &String) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Debug for StringHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StringHash(#{:08X})", self.0)
    }
}

impl std::fmt::Display for StringHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}
