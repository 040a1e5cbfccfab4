//! Sequential readers over a prefab tree.
//!
//! A reader walks one node at a time:
//!
//! ```text
//! read_node
//! read_num_components, read_component × N
//! read_num_children, (begin_child, <child walk>, end_child) × M
//! ```
//!
//! The walk ends when the root reports no children, or when the last
//! child of the root is closed. Calling out of order panics.

use redlilium_archive::{Archive, ArchiveError, serialize_in_block};

use crate::flags::PrefabArchiveFlags;
use crate::prefab::{NodePrefab, SerializablePrefab};

/// Sequential access to a prefab tree.
pub trait PrefabReader {
    fn read_node(&mut self) -> Result<&SerializablePrefab, ArchiveError>;
    fn read_num_components(&mut self) -> Result<usize, ArchiveError>;
    fn read_component(&mut self) -> Result<&SerializablePrefab, ArchiveError>;
    fn read_num_children(&mut self) -> Result<usize, ArchiveError>;
    fn begin_child(&mut self) -> Result<(), ArchiveError>;
    fn end_child(&mut self) -> Result<(), ArchiveError>;
    fn is_eof(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

struct MemoryFrame<'a> {
    prefab: &'a NodePrefab,
    next_child: usize,
}

/// Reads a [`NodePrefab`] held in memory.
pub struct PrefabReaderFromMemory<'a> {
    stack: Vec<MemoryFrame<'a>>,
    next_component: usize,
    eof: bool,
}

impl<'a> PrefabReaderFromMemory<'a> {
    pub fn new(prefab: &'a NodePrefab) -> Self {
        Self {
            stack: vec![MemoryFrame {
                prefab,
                next_child: 0,
            }],
            next_component: 0,
            eof: false,
        }
    }

    fn current(&self) -> &MemoryFrame<'a> {
        assert!(!self.eof, "prefab reader used after end of file");
        let Some(frame) = self.stack.last() else {
            unreachable!("root frame is never popped");
        };
        frame
    }
}

impl PrefabReader for PrefabReaderFromMemory<'_> {
    fn read_node(&mut self) -> Result<&SerializablePrefab, ArchiveError> {
        let prefab = self.current().prefab;
        Ok(&prefab.node)
    }

    fn read_num_components(&mut self) -> Result<usize, ArchiveError> {
        self.next_component = 0;
        Ok(self.current().prefab.components.len())
    }

    fn read_component(&mut self) -> Result<&SerializablePrefab, ArchiveError> {
        let prefab = self.current().prefab;
        let Some(component) = prefab.components.get(self.next_component) else {
            panic!("read past the last component");
        };
        self.next_component += 1;
        Ok(component)
    }

    fn read_num_children(&mut self) -> Result<usize, ArchiveError> {
        let count = self.current().prefab.children.len();
        if count == 0 && self.stack.len() == 1 {
            self.eof = true;
        }
        Ok(count)
    }

    fn begin_child(&mut self) -> Result<(), ArchiveError> {
        assert!(!self.eof, "prefab reader used after end of file");
        let Some(frame) = self.stack.last_mut() else {
            unreachable!("root frame is never popped");
        };
        let parent = frame.prefab;
        let Some(child) = parent.children.get(frame.next_child) else {
            panic!("read past the last child");
        };
        frame.next_child += 1;

        self.stack.push(MemoryFrame {
            prefab: child,
            next_child: 0,
        });
        self.next_component = 0;
        Ok(())
    }

    fn end_child(&mut self) -> Result<(), ArchiveError> {
        assert!(self.stack.len() > 1, "end_child without begin_child");
        self.stack.pop();
        if let [root] = self.stack.as_slice() {
            if root.next_child == root.prefab.children.len() {
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

/// Reads a prefab tree stored by [`NodePrefab::serialize_in_block`] or
/// [`PrefabWriterToArchive`](super::PrefabWriterToArchive) without
/// loading it into memory.
pub struct PrefabReaderFromArchive<'a> {
    archive: &'a mut dyn Archive,
    has_root_block: bool,
    flags: PrefabArchiveFlags,
    node: SerializablePrefab,
    component: SerializablePrefab,
    components_left: usize,
    /// Remaining children of every open `nodes` array.
    children_left: Vec<usize>,
    eof: bool,
}

impl<'a> PrefabReaderFromArchive<'a> {
    /// Starts reading. With `block_name` the tree is read from inside a
    /// block of that name, which is closed at end of file.
    pub fn new(
        archive: &'a mut dyn Archive,
        block_name: Option<&str>,
        flags: PrefabArchiveFlags,
    ) -> Result<Self, ArchiveError> {
        if let Some(name) = block_name {
            archive.begin_unordered_block(name)?;
        }
        Ok(Self {
            archive,
            has_root_block: block_name.is_some(),
            flags,
            node: SerializablePrefab::default(),
            component: SerializablePrefab::default(),
            components_left: 0,
            children_left: Vec::new(),
            eof: false,
        })
    }

    /// Opens an array that text formats omit when empty. An empty array is
    /// closed immediately.
    fn open_optional_array(&mut self, name: &str) -> Result<usize, ArchiveError> {
        if self.archive.is_unordered_access_supported() && !self.archive.has_element(name) {
            return Ok(0);
        }
        let count = self.archive.begin_array_block(name, 0)?;
        if count == 0 {
            self.archive.end_block()?;
        }
        Ok(count)
    }

    fn finish(&mut self) -> Result<(), ArchiveError> {
        if self.has_root_block {
            self.archive.end_block()?;
        }
        self.eof = true;
        log::trace!("Prefab archive fully read");
        Ok(())
    }
}

impl PrefabReader for PrefabReaderFromArchive<'_> {
    fn read_node(&mut self) -> Result<&SerializablePrefab, ArchiveError> {
        assert!(!self.eof, "prefab reader used after end of file");
        let flags = self.flags | PrefabArchiveFlags::IGNORE_SERIALIZABLE_TYPE;
        let node = &mut self.node;
        serialize_in_block(self.archive, "node", |ar| {
            node.serialize_in_block(ar, flags, false)
        })?;
        Ok(&self.node)
    }

    fn read_num_components(&mut self) -> Result<usize, ArchiveError> {
        assert!(!self.eof, "prefab reader used after end of file");
        self.components_left = self.open_optional_array("components")?;
        Ok(self.components_left)
    }

    fn read_component(&mut self) -> Result<&SerializablePrefab, ArchiveError> {
        assert!(self.components_left > 0, "read past the last component");
        let flags = self.flags;
        let component = &mut self.component;
        serialize_in_block(self.archive, "component", |ar| {
            component.serialize_in_block(ar, flags, false)
        })?;
        self.components_left -= 1;
        if self.components_left == 0 {
            self.archive.end_block()?;
        }
        Ok(&self.component)
    }

    fn read_num_children(&mut self) -> Result<usize, ArchiveError> {
        assert!(!self.eof, "prefab reader used after end of file");
        assert!(self.components_left == 0, "components left unread");
        let count = self.open_optional_array("nodes")?;
        if count > 0 {
            self.children_left.push(count);
        } else if self.children_left.is_empty() {
            self.finish()?;
        }
        Ok(count)
    }

    fn begin_child(&mut self) -> Result<(), ArchiveError> {
        assert!(
            self.children_left.last().is_some_and(|&left| left > 0),
            "read past the last child"
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
