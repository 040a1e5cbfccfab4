//! The [`Archive`] trait and block helpers.
//!
//! An archive is a bidirectional stream of nested blocks. The same
//! `serialize_*` call writes a value into an output archive or overwrites
//! it from an input archive, so most serialization code is written once:
//!
//! ```
//! use redlilium_archive::{Archive, ArchiveError};
//!
//! struct Probe {
//!     radius: f32,
//!     name: String,
//! }
//!
//! impl Probe {
//!     fn serialize_in_block(&mut self, ar: &mut dyn Archive) -> Result<(), ArchiveError> {
//!         ar.serialize_f32("radius", &mut self.radius)?;
//!         ar.serialize_string("name", &mut self.name)
//!     }
//! }
//! ```
//!
//! Two block kinds exist:
//!
//! - **unordered** blocks address their elements by name. Text archives
//!   ([`is_unordered_access_supported`](Archive::is_unordered_access_supported))
//!   can look elements up in any order and report missing ones through
//!   [`has_element`](Archive::has_element). Binary archives read elements in
//!   the order they were written and ignore names.
//! - **array** blocks hold a sequence of elements. The element count is
//!   passed as a size hint on output and returned on input.

use crate::error::ArchiveError;

/// A block-structured reader/writer over a persisted format.
pub trait Archive {
    /// Returns `true` when values are read from the archive.
    fn is_input(&self) -> bool;

    /// Returns `true` for text formats (JSON, XML).
    fn is_human_readable(&self) -> bool;

    /// Returns `true` when elements of unordered blocks may be accessed by
    /// name in any order, and may be absent.
    fn is_unordered_access_supported(&self) -> bool;

    /// Returns `true` if the current block of an input archive contains an
    /// element with this name. Always `false` for output archives and for
    /// archives without unordered access.
    fn has_element(&self, name: &str) -> bool;

    /// Opens a block whose elements are addressed by name.
    fn begin_unordered_block(&mut self, name: &str) -> Result<(), ArchiveError>;

    /// Opens a block holding a sequence of elements.
    ///
    /// On output `size_hint` must be the exact number of elements that will
    /// be written. On input it is ignored. Returns the number of elements.
    fn begin_array_block(&mut self, name: &str, size_hint: usize) -> Result<usize, ArchiveError>;

    /// Closes the innermost open block.
    fn end_block(&mut self) -> Result<(), ArchiveError>;

    fn serialize_bool(&mut self, name: &str, value: &mut bool) -> Result<(), ArchiveError>;
    fn serialize_u8(&mut self, name: &str, value: &mut u8) -> Result<(), ArchiveError>;
    fn serialize_i32(&mut self, name: &str, value: &mut i32) -> Result<(), ArchiveError>;
    fn serialize_u32(&mut self, name: &str, value: &mut u32) -> Result<(), ArchiveError>;
    fn serialize_i64(&mut self, name: &str, value: &mut i64) -> Result<(), ArchiveError>;
    fn serialize_u64(&mut self, name: &str, value: &mut u64) -> Result<(), ArchiveError>;
    fn serialize_f32(&mut self, name: &str, value: &mut f32) -> Result<(), ArchiveError>;
    fn serialize_f64(&mut self, name: &str, value: &mut f64) -> Result<(), ArchiveError>;
    fn serialize_string(&mut self, name: &str, value: &mut String) -> Result<(), ArchiveError>;
    fn serialize_bytes(&mut self, name: &str, value: &mut Vec<u8>) -> Result<(), ArchiveError>;

    /// Serializes an unsigned integer using variable-length encoding where
    /// the format supports it. Text archives store a plain number.
    fn serialize_vle(&mut self, name: &str, value: &mut u32) -> Result<(), ArchiveError> {
        self.serialize_u32(name, value)
    }
}

/// Serializes `value` inside a named unordered block.
pub fn serialize_in_block<F>(ar: &mut dyn Archive, name: &str, f: F) -> Result<(), ArchiveError>
where
    F: FnOnce(&mut dyn Archive) -> Result<(), ArchiveError>,
{
    ar.begin_unordered_block(name)?;
    f(ar)?;
    ar.end_block()
}

/// Serializes a vector as an array block of unordered element blocks.
///
/// On input the vector is cleared, and each element starts as `T::default()`
/// before `f` reads it. Elements are pushed one at a time, so a corrupt
/// count fails on the first missing element instead of allocating up front.
pub fn serialize_vector<T, F>(
    ar: &mut dyn Archive,
    name: &str,
    element_name: &str,
    items: &mut Vec<T>,
    mut f: F,
) -> Result<(), ArchiveError>
where
    T: Default,
    F: FnMut(&mut dyn Archive, &mut T) -> Result<(), ArchiveError>,
{
    let len = ar.begin_array_block(name, items.len())?;
    if ar.is_input() {
        items.clear();
        for _ in 0..len {
            let mut item = T::default();
            ar.begin_unordered_block(element_name)?;
            f(ar, &mut item)?;
            ar.end_block()?;
            items.push(item);
        }
    } else {
        for item in items.iter_mut() {
            ar.begin_unordered_block(element_name)?;
            f(ar, item)?;
            ar.end_block()?;
        }
    }
    ar.end_block()
}

/// Like [`serialize_vector`], but an empty vector is omitted from archives
/// with unordered access, and a missing block reads as empty.
pub fn serialize_optional_vector<T, F>(
    ar: &mut dyn Archive,
    name: &str,
    element_name: &str,
    items: &mut Vec<T>,
    f: F,
) -> Result<(), ArchiveError>
where
    T: Default,
    F: FnMut(&mut dyn Archive, &mut T) -> Result<(), ArchiveError>,
{
    if ar.is_unordered_access_supported() {
        if ar.is_input() {
            if !ar.has_element(name) {
                items.clear();
                return Ok(());
            }
        } else if items.is_empty() {
            return Ok(());
        }
    }
    serialize_vector(ar, name, element_name, items, f)
}

/// Serializes a value that may be omitted when equal to `default`.
///
/// Archives without unordered access always store the value.
pub fn serialize_optional<T, F>(
    ar: &mut dyn Archive,
    name: &str,
    value: &mut T,
    default: T,
    f: F,
) -> Result<(), ArchiveError>
where
    T: PartialEq,
    F: FnOnce(&mut dyn Archive, &str, &mut T) -> Result<(), ArchiveError>,
{
    if ar.is_unordered_access_supported() {
        if ar.is_input() {
            if !ar.has_element(name) {
                *value = default;
                return Ok(());
            }
        } else if *value == default {
            return Ok(());
        }
    }
    f(ar, name, value)
}
