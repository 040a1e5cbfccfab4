//! # RedLilium Scene
//!
//! Prefab serialization for scene graphs.
//!
//! - [`reflection`]: attribute schemas and the [`Serializable`] trait
//! - [`prefab`]: prefab trees with memory and archive readers/writers
//! - [`registry`]: dense component registries with versioned references
//! - [`graph`]: a live [`Scene`] that saves to and loads from prefabs
//! - [`settings`]: TOML-configurable serialization settings
//! - [`format`]: RON and bincode snapshots of prefab trees

pub mod error;
pub mod flags;
pub mod format;
pub mod graph;
pub mod prefab;
pub mod reflection;
pub mod registry;
pub mod settings;

pub use error::{FormatError, SceneError};
pub use format::{SNAPSHOT_VERSION, SnapshotFormat, decode_prefab, encode_prefab};
pub use flags::{PrefabArchiveFlags, PrefabLoadFlags, PrefabSaveFlags};
pub use graph::{ComponentSlot, Node, NodeId, Scene};
pub use prefab::{
    AttributeIdentifier, AttributePrefab, NodePrefab, PrefabReader, PrefabReaderFromArchive,
    PrefabReaderFromMemory, PrefabWriter, PrefabWriterToArchive, PrefabWriterToMemory,
    ScenePrefab, SerializableId, SerializablePrefab, transfer_prefab,
};
pub use reflection::{
    AttributeId, AttributeInfo, AttributeMode, ObjectReflection, Serializable, TypeRegistry,
};
pub use registry::{
    ComponentReference, ReferencedComponent, ReferencedComponentRegistry, RegistryListener,
    TrackedComponent, TrackedComponentRegistry,
};
pub use settings::SerializationSettings;
