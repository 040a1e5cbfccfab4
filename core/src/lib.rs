//! # RedLilium Engine Core
//!
//! Core value types shared by the serialization crates: [`StringHash`]
//! identifiers and the dynamically typed [`Variant`].

pub mod string_hash;
pub mod variant;

pub use string_hash::StringHash;
pub use variant::{ResourceRef, Variant, VariantType};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
