//! Attribute reflection for serializable objects.
//!
//! Every [`Serializable`] exposes an [`ObjectReflection`]: its type name
//! and an ordered list of [`AttributeInfo`] entries. Prefabs capture and
//! apply attributes through this schema, so the order of
//! [`ObjectReflection::attributes`] is the order attributes appear in
//! saved files.
//!
//! Reflection is usually built once per type and kept in a static:
//!
//! ```
//! use std::any::Any;
//! use std::sync::OnceLock;
//!
//! use redlilium_core::Variant;
//! use redlilium_scene::{AttributeInfo, ObjectReflection, Serializable};
//!
//! #[derive(Default)]
//! struct Light {
//!     range: f32,
//! }
//!
//! impl Serializable for Light {
//!     fn reflection(&self) -> &ObjectReflection {
//!         static REFLECTION: OnceLock<ObjectReflection> = OnceLock::new();
//!         REFLECTION.get_or_init(|| {
//!             ObjectReflection::new("Light")
//!                 .with_attribute(AttributeInfo::new("Range", Variant::Float(10.0)))
//!         })
//!     }
//!
//!     fn attribute(&self, _index: usize) -> Variant {
//!         Variant::Float(self.range)
//!     }
//!
//!     fn set_attribute(&mut self, _index: usize, value: Variant) {
//!         if let Some(range) = value.as_float() {
//!             self.range = range;
//!         }
//!     }
//!
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!
//!     fn as_any_mut(&mut self) -> &mut dyn Any {
//!         self
//!     }
//! }
//! ```

use std::any::Any;
use std::collections::HashMap;

use bitflags::bitflags;
use redlilium_core::{StringHash, Variant, VariantType};
use serde::{Deserialize, Serialize};

/// Stable numeric attribute identifier.
///
/// Attributes with an id are saved by id and survive renames.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AttributeId(pub u32);

bitflags! {
    /// Persistence mode of an attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttributeMode: u32 {
        /// The attribute is saved to files.
        const FILE = 1 << 0;
        /// The attribute is skipped when saving prefabs.
        const NO_PREFAB = 1 << 1;
    }
}

impl Default for AttributeMode {
    fn default() -> Self {
        Self::FILE
    }
}

/// Schema entry of one attribute.
#[derive(Debug, Clone)]
pub struct AttributeInfo {
    pub name: String,
    pub name_hash: StringHash,
    pub id: Option<AttributeId>,
    /// Value assigned to new objects. Also defines the attribute type.
    pub default_value: Variant,
    pub mode: AttributeMode,
    /// Names of enum values. An attribute with enum names holds
    /// [`Variant::Int`] indices into this list.
    pub enum_names: Vec<String>,
}

impl AttributeInfo {
    pub fn new(name: impl Into<String>, default_value: Variant) -> Self {
        let name = name.into();
        Self {
            name_hash: StringHash::new(&name),
            name,
            id: None,
            default_value,
            mode: AttributeMode::default(),
            enum_names: Vec::new(),
        }
    }

    /// Creates an enum attribute whose default is the value at `default_index`.
    pub fn new_enum<S: Into<String>>(
        name: impl Into<String>,
        names: impl IntoIterator<Item = S>,
        default_index: i32,
    ) -> Self {
        Self::new(name, Variant::Int(default_index)).with_enum_names(names)
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(AttributeId(id));
        self
    }

    pub fn with_mode(mut self, mode: AttributeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_enum_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.enum_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn value_type(&self) -> VariantType {
        self.default_value.variant_type()
    }

    pub fn is_enum(&self) -> bool {
        !self.enum_names.is_empty()
    }

    /// Returns the enum name of an integer value, if it is in range.
    pub fn enum_name(&self, value: i32) -> Option<&str> {
        usize::try_from(value)
            .ok()
            .and_then(|index| self.enum_names.get(index))
            .map(String::as_str)
    }

    /// Returns the integer value of an enum name.
    pub fn enum_value(&self, name: &str) -> Option<i32> {
        self.enum_names
            .iter()
            .position(|n| n == name)
            .and_then(|index| i32::try_from(index).ok())
    }
}

/// Type name and attribute schema of a serializable type.
#[derive(Debug, Clone)]
pub struct ObjectReflection {
    pub type_name: String,
    pub type_hash: StringHash,
    pub attributes: Vec<AttributeInfo>,
}

impl ObjectReflection {
    pub fn new(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            type_hash: StringHash::new(&type_name),
            type_name,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: AttributeInfo) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn find_by_id(&self, id: AttributeId) -> Option<usize> {
        self.attributes.iter().position(|a| a.id == Some(id))
    }

    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn find_by_hash(&self, hash: StringHash) -> Option<usize> {
        self.attributes.iter().position(|a| a.name_hash == hash)
    }
}

/// An object whose attributes can be captured into and applied from prefabs.
pub trait Serializable: Any {
    fn reflection(&self) -> &ObjectReflection;

    /// Returns the current value of the attribute at `index` in
    /// [`ObjectReflection::attributes`].
    fn attribute(&self, index: usize) -> Variant;

    /// Assigns the attribute at `index`. The value always has the
    /// attribute's type.
    fn set_attribute(&mut self, index: usize, value: Variant);

    /// Temporary objects are not saved unless explicitly requested.
    fn is_temporary(&self) -> bool {
        false
    }

    fn set_temporary(&mut self, _temporary: bool) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Serializable {
    pub fn downcast_ref<T: Serializable>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Serializable>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Type-erased construction of one registered type.
struct TypeEntry {
    type_name: String,
    create_fn: fn() -> Box<dyn Serializable>,
}

/// Creates serializable objects from their type hash.
#[derive(Default)]
pub struct TypeRegistry {
    entries: HashMap<StringHash, TypeEntry>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type under the hash of its reflected type name.
    ///
    /// Registering a second type with the same hash replaces the first.
    pub fn register<T: Serializable + Default>(&mut self) {
        let instance = T::default();
        let reflection = instance.reflection();
        let previous = self.entries.insert(
            reflection.type_hash,
            TypeEntry {
                type_name: reflection.type_name.clone(),
                create_fn: || -> Box<dyn Serializable> { Box::new(T::default()) },
            },
        );
        if let Some(previous) = previous {
            log::warn!(
                "Type '{}' replaces '{}' registered under {}",
                reflection.type_name,
                previous.type_name,
                reflection.type_hash
            );
        }
    }

    /// Creates a default instance of a registered type.
    pub fn create(&self, type_hash: StringHash) -> Option<Box<dyn Serializable>> {
        self.entries.get(&type_hash).map(|entry| (entry.create_fn)())
    }

    pub fn type_name(&self, type_hash: StringHash) -> Option<&str> {
        self.entries.get(&type_hash).map(|entry| entry.type_name.as_str())
    }

    pub fn contains(&self, type_hash: StringHash) -> bool {
        self.entries.contains_key(&type_hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
