//! Live scene graph.
//!
//! A [`Scene`] owns an arena of [`Node`]s addressed by [`NodeId`]. Every
//! node and component also carries a [`SerializableId`] that is unique
//! within the scene and is what prefabs store.
//!
//! ```ignore
//! let mut scene = Scene::new();
//! scene.register::<Light>();
//! let lamp = scene.create_child(scene.root())?;
//! scene.add_component(lamp, Box::new(Light::default()))?;
//! let prefab = scene.generate_prefab(lamp, PrefabSaveFlags::PREFAB)?;
//! ```

mod node;
mod serialization;

pub use node::{ComponentSlot, Node};

use std::collections::HashSet;

use redlilium_core::StringHash;

use crate::error::SceneError;
use crate::prefab::SerializableId;
use crate::reflection::{Serializable, TypeRegistry};

/// Arena handle of a node. Handles of removed nodes are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A tree of nodes with a fixed root.
pub struct Scene {
    nodes: Vec<Option<Node>>,
    ids: HashSet<SerializableId>,
    next_id: SerializableId,
    registry: TypeRegistry,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::with_registry(TypeRegistry::new())
    }

    /// Creates an empty scene that creates components through `registry`.
    pub fn with_registry(registry: TypeRegistry) -> Self {
        let mut scene = Self {
            nodes: Vec::new(),
            ids: HashSet::new(),
            next_id: 1,
            registry,
        };
        let id = scene.allocate_id(0);
        scene.nodes.push(Some(Node::new(id, None)));
        scene
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// Registers a component type for loading.
    pub fn register<T: Serializable + Default>(&mut self) {
        self.registry.register::<T>();
    }

    pub fn node(&self, node: NodeId) -> Result<&Node, SceneError> {
        self.nodes
            .get(node.0)
            .and_then(Option::as_ref)
            .ok_or(SceneError::NodeNotFound(node))
    }

    pub fn node_mut(&mut self, node: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes
            .get_mut(node.0)
            .and_then(Option::as_mut)
            .ok_or(SceneError::NodeNotFound(node))
    }

    /// Number of live nodes, including the root.
    pub fn num_nodes(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Finds a live node by its serializable id.
    pub fn find_node(&self, id: SerializableId) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|node| node.id == id))
            .map(NodeId)
    }

    pub fn is_id_used(&self, id: SerializableId) -> bool {
        self.ids.contains(&id)
    }

    /// Creates a child with a freshly allocated id.
    pub fn create_child(&mut self, parent: NodeId) -> Result<NodeId, SceneError> {
        self.create_child_with_id(parent, 0)
    }

    /// Creates a child that takes `id` if it is free. Id 0, or an id
    /// already in use, gets a fresh one.
    pub fn create_child_with_id(
        &mut self,
        parent: NodeId,
        id: SerializableId,
    ) -> Result<NodeId, SceneError> {
        self.node(parent)?;
        let id = self.allocate_id(id);
        let child = NodeId(self.nodes.len());
        self.nodes.push(Some(Node::new(id, Some(parent))));
        self.node_mut(parent)?.children.push(child);
        Ok(child)
    }

    /// Removes a node with all its descendants and components.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), SceneError> {
        if node == self.root() {
            return Err(SceneError::CannotRemoveRoot);
        }
        let parent = self.node(node)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|&child| child != node);
        }
        self.remove_subtree(node);
        Ok(())
    }

    fn remove_subtree(&mut self, node: NodeId) {
        let Some(removed) = self.nodes.get_mut(node.0).and_then(Option::take) else {
            return;
        };
        self.ids.remove(&removed.id);
        for slot in &removed.components {
            self.ids.remove(&slot.id);
        }
        for child in removed.children {
            self.remove_subtree(child);
        }
    }

    pub fn remove_all_children(&mut self, node: NodeId) -> Result<(), SceneError> {
        let children = std::mem::take(&mut self.node_mut(node)?.children);
        for child in children {
            self.remove_subtree(child);
        }
        Ok(())
    }

    /// Attaches a component and returns its id.
    pub fn add_component(
        &mut self,
        node: NodeId,
        object: Box<dyn Serializable>,
    ) -> Result<SerializableId, SceneError> {
        self.add_component_with_id(node, object, 0)
    }

    /// Attaches a component that takes `id` if it is free.
    pub fn add_component_with_id(
        &mut self,
        node: NodeId,
        object: Box<dyn Serializable>,
        id: SerializableId,
    ) -> Result<SerializableId, SceneError> {
        self.node(node)?;
        let id = self.allocate_id(id);
        self.node_mut(node)?.components.push(ComponentSlot {
            id,
            temporary: false,
            object,
        });
        Ok(id)
    }

    /// Creates a registered component type by hash and attaches it.
    pub fn create_component(
        &mut self,
        node: NodeId,
        type_hash: StringHash,
        id: SerializableId,
    ) -> Result<SerializableId, SceneError> {
        let object = self
            .registry
            .create(type_hash)
            .ok_or(SceneError::UnknownType(type_hash))?;
        self.add_component_with_id(node, object, id)
    }

    pub fn remove_component(
        &mut self,
        node: NodeId,
        id: SerializableId,
    ) -> Result<Option<Box<dyn Serializable>>, SceneError> {
        let components = &mut self.node_mut(node)?.components;
        let Some(position) = components.iter().position(|slot| slot.id == id) else {
            return Ok(None);
        };
        let slot = components.remove(position);
        self.ids.remove(&slot.id);
        Ok(Some(slot.object))
    }

    pub fn remove_all_components(&mut self, node: NodeId) -> Result<(), SceneError> {
        let components = std::mem::take(&mut self.node_mut(node)?.components);
        for slot in components {
            self.ids.remove(&slot.id);
        }
        Ok(())
    }

    /// Reserves a scene-unique id, preferring `requested`.
    fn allocate_id(&mut self, requested: SerializableId) -> SerializableId {
        if requested != 0 {
            if self.ids.insert(requested) {
                return requested;
            }
            log::warn!("Serializable id {requested} is already in use, a new id is assigned");
        }
        while self.next_id == 0 || self.ids.contains(&self.next_id) {
            self.next_id = self.next_id.wrapping_add(1);
        }
        let id = self.next_id;
        self.ids.insert(id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }
}
