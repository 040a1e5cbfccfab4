//! Dynamically typed attribute values.
//!
//! [`Variant`] is the value type stored by attribute prefabs and exchanged
//! with live objects through their reflection. [`VariantType`] is the
//! matching discriminant, persisted as a byte in binary archives and as a
//! name in text archives.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::string_hash::StringHash;

/// A typed reference to a resource by type hash and name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub type_hash: StringHash,
    pub name: String,
}

impl ResourceRef {
    pub fn new(type_name: &str, name: impl Into<String>) -> Self {
        Self {
            type_hash: StringHash::new(type_name),
            name: name.into(),
        }
    }
}

/// Discriminant of a [`Variant`].
///
/// The numeric values are part of the binary format and must not change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VariantType {
    #[default]
    None = 0,
    Bool = 1,
    Int = 2,
    Int64 = 3,
    Float = 4,
    Double = 5,
    String = 6,
    Vector2 = 7,
    Vector3 = 8,
    Vector4 = 9,
    Quaternion = 10,
    Color = 11,
    IntVector2 = 12,
    IntVector3 = 13,
    Buffer = 14,
    ResourceRef = 15,
    StringVector = 16,
    VariantVector = 17,
    VariantMap = 18,
}

impl VariantType {
    /// Every variant type, in discriminant order.
    pub const ALL: [VariantType; 19] = [
        Self::None,
        Self::Bool,
        Self::Int,
        Self::Int64,
        Self::Float,
        Self::Double,
        Self::String,
        Self::Vector2,
        Self::Vector3,
        Self::Vector4,
        Self::Quaternion,
        Self::Color,
        Self::IntVector2,
        Self::IntVector3,
        Self::Buffer,
        Self::ResourceRef,
        Self::StringVector,
        Self::VariantVector,
        Self::VariantMap,
    ];

    /// Human-readable name used by text archives.
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Int64 => "Int64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::Vector2 => "Vector2",
            Self::Vector3 => "Vector3",
            Self::Vector4 => "Vector4",
            Self::Quaternion => "Quaternion",
            Self::Color => "Color",
            Self::IntVector2 => "IntVector2",
            Self::IntVector3 => "IntVector3",
            Self::Buffer => "Buffer",
            Self::ResourceRef => "ResourceRef",
            Self::StringVector => "StringVector",
            Self::VariantVector => "VariantVector",
            Self::VariantMap => "VariantMap",
        }
    }

    /// Parses a name produced by [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ty| ty.name() == name)
    }

    /// Converts a persisted discriminant back to a type.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }
}

impl std::fmt::Display for VariantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically typed value.
///
/// Math types are stored as plain arrays. Quaternions use `[x, y, z, w]`
/// order and colors `[r, g, b, a]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Variant {
    #[default]
    None,
    Bool(bool),
    Int(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    String(String),
    Vector2([f32; 2]),
    Vector3([f32; 3]),
    Vector4([f32; 4]),
    Quaternion([f32; 4]),
    Color([f32; 4]),
    IntVector2([i32; 2]),
    IntVector3([i32; 3]),
    Buffer(Vec<u8>),
    ResourceRef(ResourceRef),
    StringVector(Vec<String>),
    VariantVector(Vec<Variant>),
    VariantMap(BTreeMap<String, Variant>),
}

impl Variant {
    /// Returns the default value for a type.
    pub fn default_for(ty: VariantType) -> Self {
        match ty {
            VariantType::None => Self::None,
            VariantType::Bool => Self::Bool(false),
            VariantType::Int => Self::Int(0),
            VariantType::Int64 => Self::Int64(0),
            VariantType::Float => Self::Float(0.0),
            VariantType::Double => Self::Double(0.0),
            VariantType::String => Self::String(String::new()),
            VariantType::Vector2 => Self::Vector2([0.0; 2]),
            VariantType::Vector3 => Self::Vector3([0.0; 3]),
            VariantType::Vector4 => Self::Vector4([0.0; 4]),
            VariantType::Quaternion => Self::Quaternion([0.0, 0.0, 0.0, 1.0]),
            VariantType::Color => Self::Color([1.0; 4]),
            VariantType::IntVector2 => Self::IntVector2([0; 2]),
            VariantType::IntVector3 => Self::IntVector3([0; 3]),
            VariantType::Buffer => Self::Buffer(Vec::new()),
            VariantType::ResourceRef => Self::ResourceRef(ResourceRef::default()),
            VariantType::StringVector => Self::StringVector(Vec::new()),
            VariantType::VariantVector => Self::VariantVector(Vec::new()),
            VariantType::VariantMap => Self::VariantMap(BTreeMap::new()),
        }
    }

    /// Returns the discriminant of this value.
    pub fn variant_type(&self) -> VariantType {
        match self {
            Self::None => VariantType::None,
            Self::Bool(_) => VariantType::Bool,
            Self::Int(_) => VariantType::Int,
            Self::Int64(_) => VariantType::Int64,
            Self::Float(_) => VariantType::Float,
            Self::Double(_) => VariantType::Double,
            Self::String(_) => VariantType::String,
            Self::Vector2(_) => VariantType::Vector2,
            Self::Vector3(_) => VariantType::Vector3,
            Self::Vector4(_) => VariantType::Vector4,
            Self::Quaternion(_) => VariantType::Quaternion,
            Self::Color(_) => VariantType::Color,
            Self::IntVector2(_) => VariantType::IntVector2,
            Self::IntVector3(_) => VariantType::IntVector3,
            Self::Buffer(_) => VariantType::Buffer,
            Self::ResourceRef(_) => VariantType::ResourceRef,
            Self::StringVector(_) => VariantType::StringVector,
            Self::VariantVector(_) => VariantType::VariantVector,
            Self::VariantMap(_) => VariantType::VariantMap,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Variant {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f32> for Variant {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<[f32; 2]> for Variant {
    fn from(v: [f32; 2]) -> Self {
        Self::Vector2(v)
    }
}

impl From<[f32; 3]> for Variant {
    fn from(v: [f32; 3]) -> Self {
        Self::Vector3(v)
    }
}

impl From<[i32; 2]> for Variant {
    fn from(v: [i32; 2]) -> Self {
        Self::IntVector2(v)
    }
}

impl From<[i32; 3]> for Variant {
    fn from(v: [i32; 3]) -> Self {
        Self::IntVector3(v)
    }
}

impl From<Vec<String>> for Variant {
    fn from(v: Vec<String>) -> Self {
        Self::StringVector(v)
    }
}

impl From<ResourceRef> for Variant {
    fn from(v: ResourceRef) -> Self {
        Self::ResourceRef(v)
    }
}
