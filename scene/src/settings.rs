//! Serialization settings loaded from TOML.
//!
//! ```toml
//! format = "binary"
//! compact_attribute_names = true
//! save_temporary = false
//! ```
//!
//! Missing keys take their default values.

use redlilium_archive::ResourceFormat;
use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::flags::{PrefabArchiveFlags, PrefabSaveFlags};

/// How scenes are written to and read from resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializationSettings {
    pub format: ResourceFormat,
    /// Store attribute name hashes instead of names.
    pub compact_attribute_names: bool,
    /// Store type name hashes instead of names in text formats. Binary
    /// resources always store hashes.
    pub compact_type_names: bool,
    pub enums_as_strings: bool,
    pub save_default_values: bool,
    /// Save temporary nodes and components.
    pub save_temporary: bool,
    /// Store the temporary flag of every object.
    pub serialize_temporary: bool,
}

impl Default for SerializationSettings {
    fn default() -> Self {
        Self {
            format: ResourceFormat::Json,
            compact_attribute_names: false,
            compact_type_names: false,
            enums_as_strings: true,
            save_default_values: false,
            save_temporary: false,
            serialize_temporary: false,
        }
    }
}

impl SerializationSettings {
    pub fn from_toml_str(text: &str) -> Result<Self, SceneError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> Result<String, SceneError> {
        Ok(toml::to_string(self)?)
    }

    pub fn save_flags(&self) -> PrefabSaveFlags {
        let mut flags = PrefabSaveFlags::empty();
        flags.set(
            PrefabSaveFlags::COMPACT_ATTRIBUTE_NAMES,
            self.compact_attribute_names,
        );
        flags.set(PrefabSaveFlags::ENUMS_AS_STRINGS, self.enums_as_strings);
        flags.set(PrefabSaveFlags::SAVE_DEFAULT_VALUES, self.save_default_values);
        flags.set(PrefabSaveFlags::SAVE_TEMPORARY, self.save_temporary);
        flags
    }

    /// Archive flags for an archive of the given kind. Reading must use
    /// the same settings as writing.
    pub fn archive_flags(&self, human_readable: bool) -> PrefabArchiveFlags {
        let mut flags = PrefabArchiveFlags::empty();
        flags.set(
            PrefabArchiveFlags::COMPACT_TYPE_NAMES,
            self.compact_type_names || !human_readable,
        );
        flags.set(PrefabArchiveFlags::SERIALIZE_TEMPORARY, self.serialize_temporary);
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let settings = SerializationSettings::from_toml_str("").unwrap();
        assert_eq!(settings, SerializationSettings::default());
        assert_eq!(settings.save_flags(), PrefabSaveFlags::ENUMS_AS_STRINGS);
    }

    #[test]
    fn parses_partial_settings() {
        let settings = SerializationSettings::from_toml_str(
            r#"
            format = "binary"
            compact_attribute_names = true
            serialize_temporary = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.format, ResourceFormat::Binary);
        assert!(settings.enums_as_strings);
        assert!(
            settings
                .save_flags()
                .contains(PrefabSaveFlags::COMPACT_ATTRIBUTE_NAMES)
        );
        assert_eq!(
            settings.archive_flags(false),
            PrefabArchiveFlags::COMPACT_TYPE_NAMES | PrefabArchiveFlags::SERIALIZE_TEMPORARY
        );
        assert_eq!(
            settings.archive_flags(true),
            PrefabArchiveFlags::SERIALIZE_TEMPORARY
        );
    }

    #[test]
    fn toml_round_trip() {
        let settings = SerializationSettings {
            format: ResourceFormat::Xml,
            save_default_values: true,
            ..Default::default()
        };
        let text = settings.to_toml_string().unwrap();
        assert_eq!(SerializationSettings::from_toml_str(&text).unwrap(), settings);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let err = SerializationSettings::from_toml_str("format = 3").unwrap_err();
        assert!(matches!(err, SceneError::Settings(_)));
    }
}
