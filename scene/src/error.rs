//! Error types for scene loading and saving.

use redlilium_archive::ArchiveError;
use redlilium_core::StringHash;

use crate::graph::NodeId;

/// Errors produced by scene graph operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The underlying archive failed to read or write.
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    /// The node handle does not refer to a live node.
    #[error("node {0:?} does not exist")]
    NodeNotFound(NodeId),
    /// The root node of a scene cannot be removed.
    #[error("the scene root cannot be removed")]
    CannotRemoveRoot,
    /// No component type is registered under the hash.
    #[error("component type {0} is not registered")]
    UnknownType(StringHash),
    /// Serialization settings could not be parsed.
    #[error("invalid serialization settings: {0}")]
    Settings(#[from] toml::de::Error),
    #[error("failed to write serialization settings: {0}")]
    SettingsEncode(#[from] toml::ser::Error),
    /// A prefab snapshot could not be encoded or decoded.
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Errors produced by the serde-based [`format`](crate::format) module.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Encoding into the requested format failed.
    #[error("failed to encode: {0}")]
    Encode(String),
    /// Decoding from the requested format failed.
    #[error("failed to decode: {0}")]
    Decode(String),
    #[error("snapshot version {0} is not supported")]
    UnsupportedVersion(u32),
}
