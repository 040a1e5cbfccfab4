//! Sequential writers producing a prefab tree.
//!
//! Writers accept the same call sequence [`PrefabReader`](super::PrefabReader)
//! produces. Counts are declared before the items they announce.

use redlilium_archive::{Archive, ArchiveError, serialize_in_block};

use crate::flags::{PrefabArchiveFlags, PrefabSaveFlags};
use crate::prefab::{NodePrefab, SerializableId, SerializablePrefab};
use crate::reflection::Serializable;

/// Sequential construction of a prefab tree.
pub trait PrefabWriter {
    /// Flags used to capture live objects.
    fn flags(&self) -> PrefabSaveFlags;

    fn write_node(&mut self, node: &SerializablePrefab) -> Result<(), ArchiveError>;
    fn write_num_components(&mut self, count: usize) -> Result<(), ArchiveError>;
    fn write_component(&mut self, component: &SerializablePrefab) -> Result<(), ArchiveError>;
    fn write_num_children(&mut self, count: usize) -> Result<(), ArchiveError>;
    fn begin_child(&mut self) -> Result<(), ArchiveError>;
    fn end_child(&mut self) -> Result<(), ArchiveError>;
    fn is_eof(&self) -> bool;

    /// Captures a live node and writes it. Node prefabs carry no type.
    fn write_node_object(
        &mut self,
        id: SerializableId,
        node: &dyn Serializable,
    ) -> Result<(), ArchiveError> {
        let mut prefab = SerializablePrefab::new(id);
        prefab.import(node, self.flags());
        prefab.clear_type();
        self.write_node(&prefab)
    }

    /// Captures a live component and writes it.
    fn write_component_object(
        &mut self,
        id: SerializableId,
        component: &dyn Serializable,
    ) -> Result<(), ArchiveError> {
        let mut prefab = SerializablePrefab::new(id);
        prefab.import(component, self.flags());
        self.write_component(&prefab)
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// Builds a [`NodePrefab`] in memory. The target is cleared on creation.
pub struct PrefabWriterToMemory<'a> {
    root: &'a mut NodePrefab,
    flags: PrefabSaveFlags,
    /// Child indices from the root to the node being written.
    path: Vec<usize>,
    components_left: usize,
    children_left: Vec<usize>,
    eof: bool,
}

impl<'a> PrefabWriterToMemory<'a> {
    pub fn new(root: &'a mut NodePrefab, flags: PrefabSaveFlags) -> Self {
        *root = NodePrefab::default();
        Self {
            root,
            flags,
            path: Vec::new(),
            components_left: 0,
            children_left: Vec::new(),
            eof: false,
        }
    }

    fn current(&mut self) -> &mut NodePrefab {
        assert!(!self.eof, "prefab writer used after end of file");
        let mut node = &mut *self.root;
        for &index in &self.path {
            node = &mut node.children[index];
        }
        node
    }
}

impl PrefabWriter for PrefabWriterToMemory<'_> {
    fn flags(&self) -> PrefabSaveFlags {
        self.flags
    }

    fn write_node(&mut self, node: &SerializablePrefab) -> Result<(), ArchiveError> {
        self.current().node.clone_from(node);
        Ok(())
    }

    fn write_num_components(&mut self, count: usize) -> Result<(), ArchiveError> {
        let components = &mut self.current().components;
        components.clear();
        self.components_left = count;
        Ok(())
    }

    fn write_component(&mut self, component: &SerializablePrefab) -> Result<(), ArchiveError> {
        assert!(self.components_left > 0, "more components than declared");
        self.current().components.push(component.clone());
        self.components_left -= 1;
        Ok(())
    }

    fn write_num_children(&mut self, count: usize) -> Result<(), ArchiveError> {
        assert!(self.components_left == 0, "fewer components than declared");
        let children = &mut self.current().children;
        children.clear();
        if count > 0 {
            self.children_left.push(count);
        } else if self.children_left.is_empty() {
            self.eof = true;
        }
        Ok(())
    }

    fn begin_child(&mut self) -> Result<(), ArchiveError> {
        assert!(
            self.children_left.last().is_some_and(|&left| left > 0),
            "more children than declared"
        );
        let children = &mut self.current().children;
        children.push(NodePrefab::default());
        let index = children.len() - 1;
        self.path.push(index);
        Ok(())
    }

    fn end_child(&mut self) -> Result<(), ArchiveError> {
        assert!(self.path.pop().is_some(), "end_child without begin_child");
        let Some(left) = self.children_left.last_mut() else {
            panic!("end_child without begin_child");
        };
        *left -= 1;
        if *left == 0 {
            self.children_left.pop();
            if self.children_left.is_empty() {
                self.eof = true;
            }
        }
        Ok(())
    }

    fn is_eof(&self) -> bool {
        self.eof
    }
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// Streams a prefab tree into an archive in the layout of
/// [`NodePrefab::serialize_in_block`].
pub struct PrefabWriterToArchive<'a> {
    archive: &'a mut dyn Archive,
    has_root_block: bool,
    save_flags: PrefabSaveFlags,
    archive_flags: PrefabArchiveFlags,
    buffer: SerializablePrefab,
    components_left: usize,
    children_left: Vec<usize>,
    eof: bool,
}

impl<'a> PrefabWriterToArchive<'a> {
    /// Starts writing. With `block_name` the tree is written inside a
    /// block of that name, which is closed at end of file.
    pub fn new(
        archive: &'a mut dyn Archive,
        block_name: Option<&str>,
        save_flags: PrefabSaveFlags,
        archive_flags: PrefabArchiveFlags,
    ) -> Result<Self, ArchiveError> {
        if let Some(name) = block_name {
            archive.begin_unordered_block(name)?;
        }
        Ok(Self {
            archive,
            has_root_block: block_name.is_some(),
            save_flags,
            archive_flags,
            buffer: SerializablePrefab::default(),
            components_left: 0,
            children_left: Vec::new(),
            eof: false,
        })
    }

    fn compact_save(&self) -> bool {
        self.save_flags
            .contains(PrefabSaveFlags::COMPACT_ATTRIBUTE_NAMES)
    }

    /// Text formats omit empty arrays. Other formats always store the count.
    fn open_optional_array(&mut self, name: &str, count: usize) -> Result<(), ArchiveError> {
        if count == 0 && self.archive.is_unordered_access_supported() {
            return Ok(());
        }
        self.archive.begin_array_block(name, count)?;
        if count == 0 {
            self.archive.end_block()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ArchiveError> {
        if self.has_root_block {
            self.archive.end_block()?;
        }
        self.eof = true;
        Ok(())
    }
}

impl PrefabWriter for PrefabWriterToArchive<'_> {
    fn flags(&self) -> PrefabSaveFlags {
        self.save_flags
    }

    fn write_node(&mut self, node: &SerializablePrefab) -> Result<(), ArchiveError> {
        assert!(!self.eof, "prefab writer used after end of file");
        let flags = self.archive_flags | PrefabArchiveFlags::IGNORE_SERIALIZABLE_TYPE;
        let compact = self.compact_save();
        self.buffer.clone_from(node);
        let buffer = &mut self.buffer;
        serialize_in_block(self.archive, "node", |ar| {
            buffer.serialize_in_block(ar, flags, compact)
        })
    }

    fn write_num_components(&mut self, count: usize) -> Result<(), ArchiveError> {
        assert!(!self.eof, "prefab writer used after end of file");
        self.open_optional_array("components", count)?;
        self.components_left = count;
        Ok(())
    }

    fn write_component(&mut self, component: &SerializablePrefab) -> Result<(), ArchiveError> {
        assert!(self.components_left > 0, "more components than declared");
        let flags = self.archive_flags;
        let compact = self.compact_save();
        self.buffer.clone_from(component);
        let buffer = &mut self.buffer;
        serialize_in_block(self.archive, "component", |ar| {
            buffer.serialize_in_block(ar, flags, compact)
        })?;
        self.components_left -= 1;
        if self.components_left == 0 {
            self.archive.end_block()?;
        }
        Ok(())
    }

    fn write_num_children(&mut self, count: usize) -> Result<(), ArchiveError> {
        assert!(!self.eof, "prefab writer used after end of file");
        assert!(self.components_left == 0, "fewer components than declared");
        self.open_optional_array("nodes", count)?;
        if count > 0 {
            self.children_left.push(count);
        } else if self.children_left.is_empty() {
            self.finish()?;
        }
        Ok(())
    }

    fn begin_child(&mut self) -> Result<(), ArchiveError> {
        assert!(
            self.children_left.last().is_some_and(|&left| left > 0),
            "more children than declared"
        );
        self.archive.begin_unordered_block("node")
    }

    fn end_child(&mut self) -> Result<(), ArchiveError> {
        self.archive.end_block()?;
        let Some(left) = self.children_left.last_mut() else {
            panic!("end_child without begin_child");
        };
        *left -= 1;
        if *left == 0 {
            self.children_left.pop();
            self.archive.end_block()?;
            if self.children_left.is_empty() {
                self.finish()?;
            }
        }
        Ok(())
    }

    fn is_eof(&self) -> bool {
        self.eof
    }
}
