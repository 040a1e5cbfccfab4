use std::any::Any;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use redlilium_core::Variant;

use crate::prefab::SerializableId;
use crate::reflection::{AttributeInfo, ObjectReflection, Serializable};

use super::NodeId;

const ATTR_ENABLED: usize = 0;
const ATTR_NAME: usize = 1;
const ATTR_TAGS: usize = 2;
const ATTR_POSITION: usize = 3;
const ATTR_ROTATION: usize = 4;
const ATTR_SCALE: usize = 5;
const ATTR_VARIABLES: usize = 6;

const IDENTITY_ROTATION: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

fn node_reflection() -> &'static ObjectReflection {
    static REFLECTION: OnceLock<ObjectReflection> = OnceLock::new();
    REFLECTION.get_or_init(|| {
        ObjectReflection::new("Node")
            .with_attribute(AttributeInfo::new("Is Enabled", Variant::Bool(true)))
            .with_attribute(AttributeInfo::new("Name", Variant::String(String::new())))
            .with_attribute(AttributeInfo::new("Tags", Variant::StringVector(Vec::new())))
            .with_attribute(AttributeInfo::new("Position", Variant::Vector3([0.0; 3])))
            .with_attribute(AttributeInfo::new(
                "Rotation",
                Variant::Quaternion(IDENTITY_ROTATION),
            ))
            .with_attribute(AttributeInfo::new("Scale", Variant::Vector3([1.0; 3])))
            .with_attribute(AttributeInfo::new(
                "Variables",
                Variant::VariantMap(BTreeMap::new()),
            ))
    })
}

/// A component attached to a node.
pub struct ComponentSlot {
    pub(crate) id: SerializableId,
    pub(crate) temporary: bool,
    pub(crate) object: Box<dyn Serializable>,
}

impl ComponentSlot {
    pub fn id(&self) -> SerializableId {
        self.id
    }

    /// A component is temporary if either the slot or the object says so.
    pub fn is_temporary(&self) -> bool {
        self.temporary || self.object.is_temporary()
    }

    pub fn set_temporary(&mut self, temporary: bool) {
        self.temporary = temporary;
        self.object.set_temporary(temporary);
    }

    pub fn object(&self) -> &dyn Serializable {
        self.object.as_ref()
    }

    pub fn object_mut(&mut self) -> &mut dyn Serializable {
        self.object.as_mut()
    }

    pub fn downcast_ref<T: Serializable>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Serializable>(&mut self) -> Option<&mut T> {
        self.object.downcast_mut::<T>()
    }
}

impl std::fmt::Debug for ComponentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSlot")
            .field("id", &self.id)
            .field("type", &self.object.reflection().type_name)
            .field("temporary", &self.temporary)
            .finish()
    }
}

/// A scene node: transform, metadata, components and child links.
#[derive(Debug)]
pub struct Node {
    pub(crate) id: SerializableId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) components: Vec<ComponentSlot>,
    name: String,
    enabled: bool,
    temporary: bool,
    tags: Vec<String>,
    position: [f32; 3],
    rotation: [f32; 4],
    scale: [f32; 3],
    variables: BTreeMap<String, Variant>,
}

impl Node {
    pub(crate) fn new(id: SerializableId, parent: Option<NodeId>) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            components: Vec::new(),
            name: String::new(),
            enabled: true,
            temporary: false,
            tags: Vec::new(),
            position: [0.0; 3],
            rotation: IDENTITY_ROTATION,
            scale: [1.0; 3],
            variables: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> SerializableId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn components(&self) -> &[ComponentSlot] {
        &self.components
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// First component of type `T`.
    pub fn component<T: Serializable>(&self) -> Option<&T> {
        self.components.iter().find_map(ComponentSlot::downcast_ref::<T>)
    }

    pub fn component_mut<T: Serializable>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(ComponentSlot::downcast_mut::<T>)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    pub fn set_position(&mut self, position: [f32; 3]) {
        self.position = position;
    }

    /// Rotation quaternion as `[x, y, z, w]`.
    pub fn rotation(&self) -> [f32; 4] {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: [f32; 4]) {
        self.rotation = rotation;
    }

    pub fn scale(&self) -> [f32; 3] {
        self.scale
    }

    pub fn set_scale(&mut self, scale: [f32; 3]) {
        self.scale = scale;
    }

    pub fn variable(&self, name: &str) -> Option<&Variant> {
        self.variables.get(name)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Variant>) {
        self.variables.insert(name.into(), value.into());
    }
}

impl Serializable for Node {
    fn reflection(&self) -> &ObjectReflection {
        node_reflection()
    }

    fn attribute(&self, index: usize) -> Variant {
        match index {
            ATTR_ENABLED => Variant::Bool(self.enabled),
            ATTR_NAME => Variant::String(self.name.clone()),
            ATTR_TAGS => Variant::StringVector(self.tags.clone()),
            ATTR_POSITION => Variant::Vector3(self.position),
            ATTR_ROTATION => Variant::Quaternion(self.rotation),
            ATTR_SCALE => Variant::Vector3(self.scale),
            ATTR_VARIABLES => Variant::VariantMap(self.variables.clone()),
            _ => Variant::None,
        }
    }

    fn set_attribute(&mut self, index: usize, value: Variant) {
        match (index, value) {
            (ATTR_ENABLED, Variant::Bool(enabled)) => self.enabled = enabled,
            (ATTR_NAME, Variant::String(name)) => self.name = name,
            (ATTR_TAGS, Variant::StringVector(tags)) => self.tags = tags,
            (ATTR_POSITION, Variant::Vector3(position)) => self.position = position,
            (ATTR_ROTATION, Variant::Quaternion(rotation)) => self.rotation = rotation,
            (ATTR_SCALE, Variant::Vector3(scale)) => self.scale = scale,
            (ATTR_VARIABLES, Variant::VariantMap(variables)) => self.variables = variables,
            (index, value) => log::debug!(
                "Ignoring {:?} value for node attribute {index}",
                value.variant_type()
            ),
        }
    }

    fn is_temporary(&self) -> bool {
        self.temporary
    }

    fn set_temporary(&mut self, temporary: bool) {
        self.temporary = temporary;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{PrefabLoadFlags, PrefabSaveFlags};
    use crate::prefab::{AttributePrefab, SerializablePrefab};

    #[test]
    fn default_node_imports_nothing() {
        let node = Node::new(1, None);
        let mut prefab = SerializablePrefab::new(1);
        prefab.import(&node, PrefabSaveFlags::empty());
        assert!(prefab.is_empty());
        assert_eq!(prefab.type_name, "Node");
    }

    #[test]
    fn changed_attributes_are_imported_in_order() {
        let mut node = Node::new(1, None);
        node.set_position([1.0, 2.0, 3.0]);
        node.set_name("Apple");

        let mut prefab = SerializablePrefab::new(1);
        prefab.import(&node, PrefabSaveFlags::empty());
        let names: Vec<_> = prefab.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Name", "Position"]);
    }

    #[test]
    fn all_attributes_with_save_default_values() {
        let node = Node::new(1, None);
        let mut prefab = SerializablePrefab::new(1);
        prefab.import(&node, PrefabSaveFlags::SAVE_DEFAULT_VALUES);
        assert_eq!(prefab.attributes.len(), node.reflection().attributes.len());
    }

    #[test]
    fn export_applies_transform_and_metadata() {
        let prefab = SerializablePrefab::new(5)
            .with_attribute(AttributePrefab::from_name("Name").with_value("Worm"))
            .with_attribute(AttributePrefab::from_name("Is Enabled").with_value(false))
            .with_attribute(AttributePrefab::from_name("Scale").with_value([2.0f32, 2.0, 2.0]))
            .with_attribute(
                AttributePrefab::from_name("Tags")
                    .with_value(vec!["enemy".to_owned(), "small".to_owned()]),
            );

        let mut node = Node::new(5, None);
        assert!(prefab.export(&mut node, PrefabLoadFlags::empty()));
        assert_eq!(node.name(), "Worm");
        assert!(!node.is_enabled());
        assert_eq!(node.scale(), [2.0; 3]);
        assert!(node.has_tag("small"));
        assert_eq!(node.rotation(), IDENTITY_ROTATION);
    }

    #[test]
    fn variables_round_trip_through_prefab() {
        let mut node = Node::new(1, None);
        node.set_variable("health", 10i32);

        let mut prefab = SerializablePrefab::new(1);
        prefab.import(&node, PrefabSaveFlags::empty());

        let mut copy = Node::new(2, None);
        prefab.export(&mut copy, PrefabLoadFlags::empty());
        assert_eq!(copy.variable("health"), Some(&Variant::Int(10)));
    }
}
