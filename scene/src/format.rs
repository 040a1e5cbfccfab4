//! Serde snapshots of prefab trees (feature-gated).
//!
//! A snapshot stores a [`NodePrefab`] exactly as it sits in memory, ids and
//! temporary flags included, wrapped with a version number. Snapshots skip
//! the [`Archive`](redlilium_archive::Archive) layer, so they are meant for
//! editor undo buffers and caches rather than shipped resources.

use serde::{Deserialize, Serialize};

use crate::error::{FormatError, SceneError};
use crate::flags::{PrefabLoadFlags, PrefabSaveFlags};
use crate::graph::{NodeId, Scene};
use crate::prefab::{NodePrefab, PrefabReaderFromMemory};

/// Version written into every snapshot. Decoding rejects other versions.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serde-backed snapshot encodings enabled at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// RON, human-readable.
    #[cfg(feature = "serialize-ron")]
    Ron,
    /// Bincode, compact.
    #[cfg(feature = "serialize-bincode")]
    Bincode,
}

impl SnapshotFormat {
    /// File extension used for snapshots in this format.
    pub fn extension(self) -> &'static str {
        match self {
            #[cfg(feature = "serialize-ron")]
            Self::Ron => "ron",
            #[cfg(feature = "serialize-bincode")]
            Self::Bincode => "bin",
        }
    }

    /// Picks the format for a file extension, if that format is enabled.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            #[cfg(feature = "serialize-ron")]
            "ron" => Some(Self::Ron),
            #[cfg(feature = "serialize-bincode")]
            "bin" => Some(Self::Bincode),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    root: &'a NodePrefab,
}

#[derive(Deserialize)]
struct SnapshotIn {
    version: u32,
    root: NodePrefab,
}

#[allow(unused_variables)]
pub fn encode_prefab(prefab: &NodePrefab, format: SnapshotFormat) -> Result<Vec<u8>, FormatError> {
    let snapshot = SnapshotOut {
        version: SNAPSHOT_VERSION,
        root: prefab,
    };
    match format {
        #[cfg(feature = "serialize-ron")]
        SnapshotFormat::Ron => {
            ron::ser::to_string_pretty(&snapshot, ron::ser::PrettyConfig::default())
                .map(String::into_bytes)
                .map_err(|e| FormatError::Encode(e.to_string()))
        }
        #[cfg(feature = "serialize-bincode")]
        SnapshotFormat::Bincode => {
            bincode::serialize(&snapshot).map_err(|e| FormatError::Encode(e.to_string()))
        }
    }
}

#[allow(unused_variables, unreachable_code)]
pub fn decode_prefab(bytes: &[u8], format: SnapshotFormat) -> Result<NodePrefab, FormatError> {
    let snapshot: SnapshotIn = match format {
        #[cfg(feature = "serialize-ron")]
        SnapshotFormat::Ron => {
            let text =
                std::str::from_utf8(bytes).map_err(|e| FormatError::Decode(e.to_string()))?;
            ron::from_str(text).map_err(|e| FormatError::Decode(e.to_string()))?
        }
        #[cfg(feature = "serialize-bincode")]
        SnapshotFormat::Bincode => {
            bincode::deserialize(bytes).map_err(|e| FormatError::Decode(e.to_string()))?
        }
    };
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(FormatError::UnsupportedVersion(snapshot.version));
    }
    Ok(snapshot.root)
}

impl Scene {
    /// Captures `node` and its subtree as a snapshot.
    pub fn save_snapshot(
        &self,
        node: NodeId,
        flags: PrefabSaveFlags,
        format: SnapshotFormat,
    ) -> Result<Vec<u8>, SceneError> {
        let prefab = self.generate_prefab(node, flags)?;
        Ok(encode_prefab(&prefab, format)?)
    }

    /// Restores a snapshot taken by [`save_snapshot`](Self::save_snapshot)
    /// into `node`.
    pub fn load_snapshot(
        &mut self,
        node: NodeId,
        bytes: &[u8],
        format: SnapshotFormat,
        flags: PrefabLoadFlags,
    ) -> Result<(), SceneError> {
        let prefab = decode_prefab(bytes, format)?;
        let mut reader = PrefabReaderFromMemory::new(&prefab);
        self.load_node(node, &mut reader, flags)
    }
}
