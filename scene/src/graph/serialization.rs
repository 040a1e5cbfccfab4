//! Saving and loading nodes through prefab readers and writers.

use redlilium_archive::{DEFAULT_ROOT_BLOCK, load_resource, save_resource};

use crate::error::SceneError;
use crate::flags::{PrefabLoadFlags, PrefabSaveFlags};
use crate::prefab::{
    NodePrefab, PrefabReader, PrefabReaderFromArchive, PrefabReaderFromMemory, PrefabWriter,
    PrefabWriterToArchive, PrefabWriterToMemory, SerializablePrefab,
};
use crate::reflection::Serializable;
use crate::settings::SerializationSettings;

use super::{NodeId, Scene};

impl Scene {
    /// Writes `node` and its subtree.
    ///
    /// Temporary nodes and components are skipped unless the writer has
    /// [`PrefabSaveFlags::SAVE_TEMPORARY`].
    pub fn save_node(
        &self,
        node: NodeId,
        writer: &mut dyn PrefabWriter,
    ) -> Result<(), SceneError> {
        let save_temporary = writer.flags().contains(PrefabSaveFlags::SAVE_TEMPORARY);
        let data = self.node(node)?;

        writer.write_node_object(data.id, data)?;

        let components: Vec<_> = data
            .components
            .iter()
            .filter(|slot| save_temporary || !slot.is_temporary())
            .collect();
        writer.write_num_components(components.len())?;
        for slot in components {
            let mut prefab = SerializablePrefab::new(slot.id);
            prefab.import(slot.object(), writer.flags());
            prefab.temporary |= slot.temporary;
            writer.write_component(&prefab)?;
        }

        let mut children = Vec::with_capacity(data.children.len());
        for &child in &data.children {
            if save_temporary || !self.node(child)?.is_temporary() {
                children.push(child);
            }
        }
        writer.write_num_children(children.len())?;
        for child in children {
            writer.begin_child()?;
            self.save_node(child, writer)?;
            writer.end_child()?;
        }
        Ok(())
    }

    /// Reads a subtree into `node`.
    ///
    /// Existing components and children are removed first unless kept by
    /// `flags`. Components of unregistered types are skipped.
    pub fn load_node(
        &mut self,
        node: NodeId,
        reader: &mut dyn PrefabReader,
        flags: PrefabLoadFlags,
    ) -> Result<(), SceneError> {
        self.node(node)?;
        if !flags.contains(PrefabLoadFlags::KEEP_EXISTING_COMPONENTS) {
            self.remove_all_components(node)?;
        }
        if !flags.contains(PrefabLoadFlags::KEEP_EXISTING_CHILDREN) {
            self.remove_all_children(node)?;
        }

        let node_prefab = reader.read_node()?;
        if !flags.contains(PrefabLoadFlags::IGNORE_ROOT_ATTRIBUTES) {
            node_prefab.export(self.node_mut(node)?, flags);
        }
        self.load_node_contents(node, reader, flags)
    }

    fn load_node_contents(
        &mut self,
        node: NodeId,
        reader: &mut dyn PrefabReader,
        flags: PrefabLoadFlags,
    ) -> Result<(), SceneError> {
        let discard_ids = flags.contains(PrefabLoadFlags::DISCARD_IDS);
        let load_as_temporary = flags.contains(PrefabLoadFlags::LOAD_AS_TEMPORARY);

        let num_components = reader.read_num_components()?;
        for _ in 0..num_components {
            let prefab = reader.read_component()?;
            let requested_id = if discard_ids { 0 } else { prefab.id };
            let id = match self.create_component(node, prefab.type_name_hash, requested_id) {
                Ok(id) => id,
                Err(SceneError::UnknownType(hash)) => {
                    log::error!(
                        "Cannot create component '{}' ({hash}), skipping it",
                        prefab.type_name
                    );
                    continue;
                }
                Err(err) => return Err(err),
            };
            let node_data = self.node_mut(node)?;
            if let Some(slot) = node_data.components.iter_mut().find(|slot| slot.id == id) {
                prefab.export(slot.object.as_mut(), flags);
                slot.temporary = prefab.temporary || load_as_temporary;
            }
        }

        let child_flags =
            flags - PrefabLoadFlags::LOAD_AS_TEMPORARY - PrefabLoadFlags::IGNORE_ROOT_ATTRIBUTES;
        let num_children = reader.read_num_children()?;
        for _ in 0..num_children {
            reader.begin_child()?;
            let child_prefab = reader.read_node()?;
            let requested_id = if discard_ids { 0 } else { child_prefab.id };
            let child = self.create_child_with_id(node, requested_id)?;
            child_prefab.export(self.node_mut(child)?, child_flags);
            self.load_node_contents(child, reader, child_flags)?;
            if load_as_temporary {
                self.node_mut(child)?.set_temporary(true);
            }
            reader.end_child()?;
        }
        Ok(())
    }

    /// Captures `node` and its subtree in memory.
    pub fn generate_prefab(
        &self,
        node: NodeId,
        flags: PrefabSaveFlags,
    ) -> Result<NodePrefab, SceneError> {
        let mut prefab = NodePrefab::default();
        let mut writer = PrefabWriterToMemory::new(&mut prefab, flags);
        self.save_node(node, &mut writer)?;
        drop(writer);
        Ok(prefab)
    }

    /// Creates a child of `parent` and loads `prefab` into it. The child
    /// is removed again if loading fails.
    pub fn instantiate_prefab(
        &mut self,
        parent: NodeId,
        prefab: &NodePrefab,
        flags: PrefabLoadFlags,
    ) -> Result<NodeId, SceneError> {
        let child = self.create_child(parent)?;
        let mut reader = PrefabReaderFromMemory::new(prefab);
        if let Err(err) = self.load_node(child, &mut reader, flags) {
            self.remove_node(child)?;
            return Err(err);
        }
        Ok(child)
    }

    /// Saves `node` as a resource in the format chosen by `settings`.
    pub fn save_to_bytes(
        &self,
        node: NodeId,
        settings: &SerializationSettings,
    ) -> Result<Vec<u8>, SceneError> {
        save_resource(settings.format, DEFAULT_ROOT_BLOCK, |ar| {
            let archive_flags = settings.archive_flags(ar.is_human_readable());
            let mut writer =
                PrefabWriterToArchive::new(ar, None, settings.save_flags(), archive_flags)?;
            self.save_node(node, &mut writer)
        })
    }

    /// Loads a resource written by [`save_to_bytes`](Self::save_to_bytes)
    /// into `node`. The format is detected from the data.
    pub fn load_from_bytes(
        &mut self,
        node: NodeId,
        data: &[u8],
        settings: &SerializationSettings,
        flags: PrefabLoadFlags,
    ) -> Result<(), SceneError> {
        load_resource(data, DEFAULT_ROOT_BLOCK, |ar| {
            let archive_flags = settings.archive_flags(ar.is_human_readable());
            let mut reader = PrefabReaderFromArchive::new(ar, None, archive_flags)?;
            self.load_node(node, &mut reader, flags)
        })
    }
}
