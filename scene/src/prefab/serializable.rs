//! Captured state of one serializable object.

use redlilium_archive::{Archive, ArchiveError, serialize_optional, serialize_optional_vector};
use redlilium_core::{StringHash, Variant, VariantType};
use serde::{Deserialize, Serialize};

use crate::flags::{PrefabArchiveFlags, PrefabLoadFlags, PrefabSaveFlags};
use crate::prefab::AttributePrefab;
use crate::reflection::{AttributeInfo, AttributeMode, ObjectReflection, Serializable};

/// Scene-local identifier of a node or component.
pub type SerializableId = u32;

/// Type, id and attribute values of a node or component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializablePrefab {
    pub type_name: String,
    pub type_name_hash: StringHash,
    pub id: SerializableId,
    pub temporary: bool,
    pub attributes: Vec<AttributePrefab>,
}

impl SerializablePrefab {
    pub fn new(id: SerializableId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_type(mut self, type_name: &str) -> Self {
        self.set_type_name(type_name);
        self
    }

    pub fn with_attribute(mut self, attribute: AttributePrefab) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn set_type_name(&mut self, type_name: &str) {
        self.type_name = type_name.to_owned();
        self.type_name_hash = StringHash::new(type_name);
    }

    /// Sets the type by hash only. The type name is cleared.
    pub fn set_type_hash(&mut self, type_hash: StringHash) {
        self.type_name.clear();
        self.type_name_hash = type_hash;
    }

    pub fn clear_type(&mut self) {
        self.type_name.clear();
        self.type_name_hash = StringHash::EMPTY;
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Captures the attributes of `object`.
    ///
    /// The id is left unchanged.
    pub fn import(&mut self, object: &dyn Serializable, flags: PrefabSaveFlags) {
        let reflection = object.reflection();
        self.type_name = reflection.type_name.clone();
        self.type_name_hash = reflection.type_hash;
        self.temporary = object.is_temporary();
        self.attributes.clear();

        for (index, info) in reflection.attributes.iter().enumerate() {
            if !info.mode.contains(AttributeMode::FILE) {
                continue;
            }
            if flags.contains(PrefabSaveFlags::PREFAB) && info.mode.contains(AttributeMode::NO_PREFAB)
            {
                continue;
            }

            let value = object.attribute(index);
            if !flags.contains(PrefabSaveFlags::SAVE_DEFAULT_VALUES) && value == info.default_value {
                continue;
            }

            let mut attribute = if flags.contains(PrefabSaveFlags::COMPACT_ATTRIBUTE_NAMES) {
                AttributePrefab::from_hash(info.name_hash)
            } else {
                AttributePrefab::from_name(info.name.as_str())
            };
            attribute.id = info.id;
            attribute.value = match value {
                Variant::Int(v) if info.is_enum() && flags.contains(PrefabSaveFlags::ENUMS_AS_STRINGS) => {
                    match info.enum_name(v) {
                        Some(name) => Variant::String(name.to_owned()),
                        None => Variant::Int(v),
                    }
                }
                other => other,
            };
            self.attributes.push(attribute);
        }
    }

    /// Applies the stored attributes to `object`.
    ///
    /// Returns `false` without touching the object if the stored type
    /// does not match it. Attributes the object does not know, or whose
    /// value cannot be converted, are skipped.
    pub fn export(&self, object: &mut dyn Serializable, flags: PrefabLoadFlags) -> bool {
        let updates = {
            let reflection = object.reflection();
            if !self.type_name_hash.is_empty() && self.type_name_hash != reflection.type_hash {
                log::warn!(
                    "Prefab of type {} cannot be applied to object of type '{}'",
                    self.type_name_hash,
                    reflection.type_name
                );
                return false;
            }

            let mut updates = Vec::with_capacity(self.attributes.len());
            for attribute in &self.attributes {
                let Some(index) = resolve(attribute, reflection) else {
                    log::trace!(
                        "Skipping unknown attribute {:?} of '{}'",
                        attribute.name,
                        reflection.type_name
                    );
                    continue;
                };
                let info = &reflection.attributes[index];
                if let Some(value) = convert_value(info, &attribute.value) {
                    updates.push((index, value));
                }
            }
            updates
        };

        for (index, value) in updates {
            object.set_attribute(index, value);
        }
        object.set_temporary(self.temporary || flags.contains(PrefabLoadFlags::LOAD_AS_TEMPORARY));
        true
    }

    /// Serializes the prefab into the current block.
    pub fn serialize_in_block(
        &mut self,
        ar: &mut dyn Archive,
        flags: PrefabArchiveFlags,
        compact_save: bool,
    ) -> Result<(), ArchiveError> {
        if ar.is_input() {
            *self = Self::default();
        }

        if !flags.contains(PrefabArchiveFlags::IGNORE_SERIALIZABLE_ID) {
            ar.serialize_vle("_id", &mut self.id)?;
        }

        if !flags.contains(PrefabArchiveFlags::IGNORE_SERIALIZABLE_TYPE) {
            self.serialize_type(ar, flags.contains(PrefabArchiveFlags::COMPACT_TYPE_NAMES))?;
        }

        if flags.contains(PrefabArchiveFlags::SERIALIZE_TEMPORARY) {
            serialize_optional(ar, "_temporary", &mut self.temporary, false, |ar, name, v| {
                ar.serialize_bool(name, v)
            })?;
        }

        serialize_optional_vector(ar, "attributes", "attribute", &mut self.attributes, |ar, a| {
            a.serialize_in_block(ar, compact_save)
        })
    }

    fn serialize_type(
        &mut self,
        ar: &mut dyn Archive,
        compact_type_names: bool,
    ) -> Result<(), ArchiveError> {
        let as_hash = if ar.is_input() {
            if ar.is_unordered_access_supported() {
                !ar.has_element("_typeName")
            } else {
                compact_type_names
            }
        } else if ar.is_unordered_access_supported() {
            compact_type_names || self.type_name.is_empty()
        } else {
            if !compact_type_names && self.type_name.is_empty() && !self.type_name_hash.is_empty() {
                log::warn!(
                    "Type {} has no name and is saved without type",
                    self.type_name_hash
                );
            }
            compact_type_names
        };

        if as_hash {
            ar.serialize_u32("_typeHash", &mut self.type_name_hash.0)?;
            if ar.is_input() {
                self.type_name.clear();
            }
        } else {
            ar.serialize_string("_typeName", &mut self.type_name)?;
            if ar.is_input() {
                self.type_name_hash = StringHash::new(&self.type_name);
            }
        }
        Ok(())
    }
}

fn resolve(attribute: &AttributePrefab, reflection: &ObjectReflection) -> Option<usize> {
    attribute
        .id
        .and_then(|id| reflection.find_by_id(id))
        .or_else(|| {
            (!attribute.name.is_empty())
                .then(|| reflection.find_by_name(&attribute.name))
                .flatten()
        })
        .or_else(|| {
            (!attribute.name_hash.is_empty())
                .then(|| reflection.find_by_hash(attribute.name_hash))
                .flatten()
        })
}

fn convert_value(info: &AttributeInfo, value: &Variant) -> Option<Variant> {
    if info.is_enum() {
        if let Variant::String(name) = value {
            return match info.enum_value(name) {
                Some(v) => Some(Variant::Int(v)),
                None => {
                    log::warn!("Unknown value '{name}' of enum attribute '{}'", info.name);
                    None
                }
            };
        }
    }

    let expected = info.value_type();
    if value.variant_type() != expected && expected != VariantType::None {
        log::warn!(
            "Attribute '{}' expects {expected}, got {}",
            info.name,
            value.variant_type()
        );
        return None;
    }
    Some(value.clone())
}
