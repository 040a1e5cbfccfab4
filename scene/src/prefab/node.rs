//! Prefab of a node with its components and children.

use redlilium_archive::{Archive, ArchiveError, serialize_in_block, serialize_optional_vector};
use serde::{Deserialize, Serialize};

use crate::flags::PrefabArchiveFlags;
use crate::prefab::{SerializableId, SerializablePrefab};

/// A node, its components and its child nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePrefab {
    pub node: SerializablePrefab,
    pub components: Vec<SerializablePrefab>,
    pub children: Vec<NodePrefab>,
}

/// A whole scene or subtree stored as a prefab.
pub type ScenePrefab = NodePrefab;

impl NodePrefab {
    pub fn new(node: SerializablePrefab) -> Self {
        Self {
            node,
            ..Default::default()
        }
    }

    /// Returns `true` if the prefab holds no attributes, components or
    /// children.
    pub fn is_empty(&self) -> bool {
        self.node.is_empty() && self.components.is_empty() && self.children.is_empty()
    }

    /// Total number of nodes in the tree, including this one.
    pub fn num_nodes(&self) -> usize {
        1 + self.children.iter().map(NodePrefab::num_nodes).sum::<usize>()
    }

    /// Renumbers node and component ids in depth-first order.
    ///
    /// Nodes and components are counted separately, both starting at 1.
    pub fn normalize_ids(&mut self) {
        let mut next_node: SerializableId = 1;
        let mut next_component: SerializableId = 1;
        self.normalize_ids_from(&mut next_node, &mut next_component);
    }

    fn normalize_ids_from(&mut self, next_node: &mut SerializableId, next_component: &mut SerializableId) {
        self.node.id = *next_node;
        *next_node += 1;
        for component in &mut self.components {
            component.id = *next_component;
            *next_component += 1;
        }
        for child in &mut self.children {
            child.normalize_ids_from(next_node, next_component);
        }
    }

    /// Serializes the whole tree into the current block.
    ///
    /// Layout: a `node` block, then optional `components` and `nodes`
    /// arrays. The node block never stores a type.
    pub fn serialize_in_block(
        &mut self,
        ar: &mut dyn Archive,
        flags: PrefabArchiveFlags,
        compact_save: bool,
    ) -> Result<(), ArchiveError> {
        let node_flags = flags | PrefabArchiveFlags::IGNORE_SERIALIZABLE_TYPE;
        serialize_in_block(ar, "node", |ar| {
            self.node.serialize_in_block(ar, node_flags, compact_save)
        })?;
        serialize_optional_vector(ar, "components", "component", &mut self.components, |ar, c| {
            c.serialize_in_block(ar, flags, compact_save)
        })?;
        serialize_optional_vector(ar, "nodes", "node", &mut self.children, |ar, child| {
            child.serialize_in_block(ar, flags, compact_save)
        })
    }
}

#[cfg(test)]
mod tests {
    use redlilium_archive::{JsonInputArchive, JsonOutputArchive};

    use super::*;
    use crate::prefab::AttributePrefab;

    fn small_tree() -> NodePrefab {
        let mut root = NodePrefab::new(
            SerializablePrefab::new(40)
                .with_attribute(AttributePrefab::from_name("Name").with_value("Root")),
        );
        root.components.push(SerializablePrefab::new(90).with_type("Light"));
        root.components.push(SerializablePrefab::new(91).with_type("Light"));

        let mut child = NodePrefab::new(SerializablePrefab::new(41));
        child.components.push(SerializablePrefab::new(95).with_type("Mesh"));
        child.children.push(NodePrefab::new(SerializablePrefab::new(42)));
        root.children.push(child);
        root.children.push(NodePrefab::new(SerializablePrefab::new(43)));
        root
    }

    #[test]
    fn empty_prefab() {
        assert!(NodePrefab::default().is_empty());
        assert!(!small_tree().is_empty());
        assert!(!NodePrefab {
            children: vec![NodePrefab::default()],
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn normalize_ids_is_depth_first() {
        let mut tree = small_tree();
        tree.normalize_ids();

        assert_eq!(tree.node.id, 1);
        assert_eq!(tree.children[0].node.id, 2);
        assert_eq!(tree.children[0].children[0].node.id, 3);
        assert_eq!(tree.children[1].node.id, 4);

        let component_ids: Vec<_> = tree
            .components
            .iter()
            .chain(&tree.children[0].components)
            .map(|c| c.id)
            .collect();
        assert_eq!(component_ids, [1, 2, 3]);
        assert_eq!(tree.num_nodes(), 4);
    }

    #[test]
    fn json_omits_empty_blocks() {
        let mut leaf = NodePrefab::new(SerializablePrefab::new(42));
        let mut ar = JsonOutputArchive::new();
        ar.begin_unordered_block("scene").unwrap();
        leaf.serialize_in_block(&mut ar, PrefabArchiveFlags::empty(), false)
            .unwrap();
        ar.end_block().unwrap();

        let doc = ar.into_value().unwrap();
        assert_eq!(doc, serde_json::json!({ "node": { "_id": 42 } }));
    }

    #[test]
    fn json_round_trip() {
        let mut source = small_tree();
        let mut ar = JsonOutputArchive::new();
        ar.begin_unordered_block("scene").unwrap();
        source
            .serialize_in_block(&mut ar, PrefabArchiveFlags::empty(), false)
            .unwrap();
        ar.end_block().unwrap();
        let doc = ar.into_value().unwrap();

        let mut input = JsonInputArchive::new(&doc);
        let mut dest = NodePrefab::default();
        input.begin_unordered_block("scene").unwrap();
        dest.serialize_in_block(&mut input, PrefabArchiveFlags::empty(), false)
            .unwrap();
        input.end_block().unwrap();
        assert_eq!(dest, source);
    }
}
