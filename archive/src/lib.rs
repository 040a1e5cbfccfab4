//! # RedLilium Archive
//!
//! Block-structured archives used by the prefab serialization layer.
//!
//! - [`Archive`]: the bidirectional reader/writer trait
//! - [`BinaryOutputArchive`] / [`BinaryInputArchive`]: compact binary encoding
//! - [`JsonOutputArchive`] / [`JsonInputArchive`]: JSON over `serde_json`
//! - [`XmlOutputArchive`] / [`XmlInputArchive`]: XML over `quick-xml`
//! - [`save_resource`] / [`load_resource`]: whole-file helpers with format
//!   detection via [`peek_resource_format`]

pub mod archive;
pub mod binary;
pub mod error;
pub mod json;
pub mod resource;
pub mod variant;
pub mod xml;

pub use archive::{
    Archive, serialize_in_block, serialize_optional, serialize_optional_vector, serialize_vector,
};
pub use binary::{BinaryInputArchive, BinaryOutputArchive};
pub use error::ArchiveError;
pub use json::{JsonInputArchive, JsonOutputArchive};
pub use resource::{
    DEFAULT_BINARY_MAGIC, DEFAULT_ROOT_BLOCK, ResourceFormat, load_resource, peek_resource_format,
    save_resource,
};
pub use variant::{serialize_variant_in_block, serialize_variant_type, serialize_variant_value};
pub use xml::{XmlElement, XmlInputArchive, XmlOutputArchive};
