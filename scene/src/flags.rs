//! Flag sets controlling how prefabs are captured, archived and loaded.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Controls how live objects are captured into prefabs.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PrefabSaveFlags: u32 {
        /// Store attribute name hashes instead of names.
        const COMPACT_ATTRIBUTE_NAMES = 1 << 0;
        /// Store enum attributes as their names instead of integers.
        const ENUMS_AS_STRINGS = 1 << 1;
        /// Store attributes even when they hold their default value.
        const SAVE_DEFAULT_VALUES = 1 << 2;
        /// Include temporary nodes and components.
        const SAVE_TEMPORARY = 1 << 3;
        /// Skip attributes excluded from prefabs.
        const PREFAB = 1 << 4;
    }
}

bitflags! {
    /// Controls which serializable fields are present in an archive.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PrefabArchiveFlags: u32 {
        /// Do not store `_id`.
        const IGNORE_SERIALIZABLE_ID = 1 << 0;
        /// Do not store `_typeName` / `_typeHash`.
        const IGNORE_SERIALIZABLE_TYPE = 1 << 1;
        /// Store `_typeHash` instead of `_typeName`.
        const COMPACT_TYPE_NAMES = 1 << 2;
        /// Store the `_temporary` flag.
        const SERIALIZE_TEMPORARY = 1 << 3;
    }
}

bitflags! {
    /// Controls how prefabs are applied to live objects.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PrefabLoadFlags: u32 {
        /// Assign fresh ids instead of the stored ones.
        const DISCARD_IDS = 1 << 0;
        /// Mark every loaded object as temporary.
        const LOAD_AS_TEMPORARY = 1 << 1;
        /// Keep components already present on the target node.
        const KEEP_EXISTING_COMPONENTS = 1 << 2;
        /// Keep children already present on the target node.
        const KEEP_EXISTING_CHILDREN = 1 << 3;
        /// Leave the attributes of the target node untouched.
        const IGNORE_ROOT_ATTRIBUTES = 1 << 4;
    }
}
