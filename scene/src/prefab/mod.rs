//! Prefabs: archived snapshots of nodes, components and their attributes.
//!
//! - [`AttributePrefab`]: one attribute value
//! - [`SerializablePrefab`]: type, id and attributes of one object
//! - [`NodePrefab`]: a node with components and children
//! - [`PrefabReader`] / [`PrefabWriter`]: sequential access over memory or
//!   archives

mod attribute;
mod node;
mod reader;
mod serializable;
mod writer;

pub use attribute::{AttributeIdentifier, AttributePrefab};
pub use node::{NodePrefab, ScenePrefab};
pub use reader::{PrefabReader, PrefabReaderFromArchive, PrefabReaderFromMemory};
pub use serializable::{SerializableId, SerializablePrefab};
pub use writer::{PrefabWriter, PrefabWriterToArchive, PrefabWriterToMemory};

use redlilium_archive::ArchiveError;

/// Copies the remaining tree of `reader` into `writer`.
pub fn transfer_prefab(
    reader: &mut dyn PrefabReader,
    writer: &mut dyn PrefabWriter,
) -> Result<(), ArchiveError> {
    writer.write_node(reader.read_node()?)?;

    let num_components = reader.read_num_components()?;
    writer.write_num_components(num_components)?;
    for _ in 0..num_components {
        writer.write_component(reader.read_component()?)?;
    }

    let num_children = reader.read_num_children()?;
    writer.write_num_children(num_children)?;
    for _ in 0..num_children {
        reader.begin_child()?;
        writer.begin_child()?;
        transfer_prefab(reader, writer)?;
        reader.end_child()?;
        writer.end_child()?;
    }
    Ok(())
}
