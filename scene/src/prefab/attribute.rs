//! One attribute value of a serializable prefab.

use redlilium_archive::{
    Archive, ArchiveError, serialize_variant_type, serialize_variant_value,
};
use redlilium_core::{StringHash, Variant, VariantType};
use serde::{Deserialize, Serialize};

use crate::reflection::AttributeId;

/// Which identifier an attribute is addressed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AttributeIdentifier {
    Unused = 0,
    Id = 1,
    Name = 2,
    NameHash = 3,
}

impl AttributeIdentifier {
    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(Self::Unused),
            1 => Some(Self::Id),
            2 => Some(Self::Name),
            3 => Some(Self::NameHash),
            _ => None,
        }
    }
}

const IDENTIFIER_SHIFT: u8 = 5;
const VARIANT_TYPE_MASK: u8 = (1 << IDENTIFIER_SHIFT) - 1;

/// An attribute value addressed by id, name or name hash.
///
/// A name always comes with its hash. Prefabs loaded from compact files
/// carry only the hash.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributePrefab {
    pub id: Option<AttributeId>,
    pub name: String,
    pub name_hash: StringHash,
    pub value: Variant,
}

impl AttributePrefab {
    pub fn from_id(id: AttributeId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name_hash: StringHash::new(&name),
            name,
            ..Default::default()
        }
    }

    pub fn from_hash(name_hash: StringHash) -> Self {
        Self {
            name_hash,
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<Variant>) -> Self {
        self.value = value.into();
        self
    }

    pub fn set_value(&mut self, value: impl Into<Variant>) {
        self.value = value.into();
    }

    pub fn value_type(&self) -> VariantType {
        self.value.variant_type()
    }

    /// Returns the strongest identifier present.
    pub fn identifier_type(&self) -> AttributeIdentifier {
        if self.id.is_some() {
            AttributeIdentifier::Id
        } else if !self.name.is_empty() {
            AttributeIdentifier::Name
        } else if !self.name_hash.is_empty() {
            AttributeIdentifier::NameHash
        } else {
            AttributeIdentifier::Unused
        }
    }

    /// Serializes the attribute into the current block.
    ///
    /// Only the strongest identifier is written. With `compact_save` a
    /// name is written as its hash.
    pub fn serialize_in_block(
        &mut self,
        ar: &mut dyn Archive,
        compact_save: bool,
    ) -> Result<(), ArchiveError> {
        if ar.is_input() {
            self.read(ar)
        } else {
            self.write(ar, compact_save)
        }
    }

    fn write(&mut self, ar: &mut dyn Archive, compact_save: bool) -> Result<(), ArchiveError> {
        let identifier = match self.identifier_type() {
            AttributeIdentifier::Name if compact_save => AttributeIdentifier::NameHash,
            other => other,
        };
        let mut ty = self.value_type();

        if ar.is_human_readable() {
            self.serialize_identifier(ar, identifier)?;
            serialize_variant_type(ar, "type", &mut ty)?;
        } else {
            let mut header = ((identifier as u8) << IDENTIFIER_SHIFT) | ty as u8;
            ar.serialize_u8("header", &mut header)?;
            self.serialize_identifier(ar, identifier)?;
        }
        serialize_variant_value(ar, "value", ty, &mut self.value)
    }

    fn read(&mut self, ar: &mut dyn Archive) -> Result<(), ArchiveError> {
        *self = Self::default();

        let (identifier, ty) = if ar.is_human_readable() {
            let identifier = if ar.has_element("id") {
                AttributeIdentifier::Id
            } else if ar.has_element("name") {
                AttributeIdentifier::Name
            } else if ar.has_element("nameHash") {
                AttributeIdentifier::NameHash
            } else {
                AttributeIdentifier::Unused
            };
            self.serialize_identifier(ar, identifier)?;
            let mut ty = VariantType::None;
            serialize_variant_type(ar, "type", &mut ty)?;
            (identifier, ty)
        } else {
            let mut header = 0u8;
            ar.serialize_u8("header", &mut header)?;
            let identifier =
                AttributeIdentifier::from_bits(header >> IDENTIFIER_SHIFT).ok_or_else(|| {
                    ArchiveError::InvalidValue {
                        name: "header".into(),
                        message: format!("unknown attribute identifier in {header:#04x}"),
                    }
                })?;
            let ty = VariantType::from_u8(header & VARIANT_TYPE_MASK).ok_or_else(|| {
                ArchiveError::InvalidValue {
                    name: "header".into(),
                    message: format!("unknown variant type in {header:#04x}"),
                }
            })?;
            self.serialize_identifier(ar, identifier)?;
            (identifier, ty)
        };

        if identifier == AttributeIdentifier::Name {
            self.name_hash = StringHash::new(&self.name);
        }
        serialize_variant_value(ar, "value", ty, &mut self.value)
    }

    fn serialize_identifier(
        &mut self,
        ar: &mut dyn Archive,
        identifier: AttributeIdentifier,
    ) -> Result<(), ArchiveError> {
        match identifier {
            AttributeIdentifier::Unused => Ok(()),
            AttributeIdentifier::Id => {
                let mut raw = self.id.map_or(0, |id| id.0);
                ar.serialize_vle("id", &mut raw)?;
                self.id = Some(AttributeId(raw));
                Ok(())
            }
            AttributeIdentifier::Name => ar.serialize_string("name", &mut self.name),
            AttributeIdentifier::NameHash => ar.serialize_u32("nameHash", &mut self.name_hash.0),
        }
    }
}
