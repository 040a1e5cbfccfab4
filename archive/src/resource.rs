//! Resource files: a root block stored in one of the archive formats.
//!
//! Binary resources start with [`DEFAULT_BINARY_MAGIC`]. JSON and XML
//! resources are recognized by their first significant character.

use serde::{Deserialize, Serialize};

use crate::archive::Archive;
use crate::binary::{BinaryInputArchive, BinaryOutputArchive};
use crate::error::ArchiveError;
use crate::json::{JsonInputArchive, JsonOutputArchive};
use crate::xml::{XmlInputArchive, XmlOutputArchive, parse_document};

/// Magic prefix of binary resources.
pub const DEFAULT_BINARY_MAGIC: [u8; 4] = *b"\0RLB";

/// Conventional name of the root block of a resource.
pub const DEFAULT_ROOT_BLOCK: &str = "resource";

/// Encoding of a resource file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFormat {
    Binary,
    #[default]
    Json,
    Xml,
    Unknown,
}

/// Detects the format of resource data without parsing it.
pub fn peek_resource_format(data: &[u8]) -> ResourceFormat {
    if data.starts_with(&DEFAULT_BINARY_MAGIC) {
        return ResourceFormat::Binary;
    }

    let text = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    match text.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => ResourceFormat::Json,
        Some(b'<') => ResourceFormat::Xml,
        _ => ResourceFormat::Unknown,
    }
}

/// Writes a resource whose root block is filled by `f`.
pub fn save_resource<E, F>(format: ResourceFormat, root: &str, f: F) -> Result<Vec<u8>, E>
where
    E: From<ArchiveError>,
    F: FnOnce(&mut dyn Archive) -> Result<(), E>,
{
    match format {
        ResourceFormat::Binary => {
            let mut ar = BinaryOutputArchive::with_prefix(&DEFAULT_BINARY_MAGIC);
            fill_root(&mut ar, root, f)?;
            Ok(ar.into_bytes()?)
        }
        ResourceFormat::Json => {
            let mut ar = JsonOutputArchive::new();
            fill_root(&mut ar, root, f)?;
            Ok(ar.into_string()?.into_bytes())
        }
        ResourceFormat::Xml => {
            let mut ar = XmlOutputArchive::new();
            fill_root(&mut ar, root, f)?;
            Ok(ar.into_string()?.into_bytes())
        }
        ResourceFormat::Unknown => Err(ArchiveError::UnknownFormat.into()),
    }
}

/// Reads a resource, detecting its format, and passes the opened root
/// block to `f`.
pub fn load_resource<E, F>(data: &[u8], root: &str, f: F) -> Result<(), E>
where
    E: From<ArchiveError>,
    F: FnOnce(&mut dyn Archive) -> Result<(), E>,
{
    let format = peek_resource_format(data);
    log::trace!("Loading {format:?} resource ({} bytes)", data.len());

    match format {
        ResourceFormat::Binary => {
            let mut ar = BinaryInputArchive::new(&data[DEFAULT_BINARY_MAGIC.len()..]);
            fill_root(&mut ar, root, f)
        }
        ResourceFormat::Json => {
            let document: serde_json::Value =
                serde_json::from_slice(data).map_err(ArchiveError::from)?;
            let mut ar = JsonInputArchive::new(&document);
            fill_root(&mut ar, root, f)
        }
        ResourceFormat::Xml => {
            let text = std::str::from_utf8(data)
                .map_err(|e| ArchiveError::Xml(e.to_string()))?;
            let document = parse_document(text)?;
            let mut ar = XmlInputArchive::new(&document);
            fill_root(&mut ar, root, f)
        }
        ResourceFormat::Unknown => Err(ArchiveError::UnknownFormat.into()),
    }
}

fn fill_root<E, F>(ar: &mut dyn Archive, root: &str, f: F) -> Result<(), E>
where
    E: From<ArchiveError>,
    F: FnOnce(&mut dyn Archive) -> Result<(), E>,
{
    ar.begin_unordered_block(root)?;
    f(ar)?;
    ar.end_block()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_detects_formats() {
        assert_eq!(peek_resource_format(b"\0RLB\x01"), ResourceFormat::Binary);
        assert_eq!(peek_resource_format(b"  \n{ }"), ResourceFormat::Json);
        assert_eq!(
            peek_resource_format(b"\xEF\xBB\xBF<?xml version=\"1.0\"?>"),
            ResourceFormat::Xml
        );
        assert_eq!(peek_resource_format(b"key = 1"), ResourceFormat::Unknown);
        assert_eq!(peek_resource_format(b""), ResourceFormat::Unknown);
    }

    #[test]
    fn unknown_format_cannot_be_saved_or_loaded() {
        let saved: Result<Vec<u8>, ArchiveError> =
            save_resource(ResourceFormat::Unknown, DEFAULT_ROOT_BLOCK, |_| Ok(()));
        assert!(matches!(saved, Err(ArchiveError::UnknownFormat)));

        let loaded: Result<(), ArchiveError> = load_resource(b"???", DEFAULT_ROOT_BLOCK, |_| Ok(()));
        assert!(matches!(loaded, Err(ArchiveError::UnknownFormat)));
    }

    #[test]
    fn binary_resources_carry_magic() {
        let bytes: Vec<u8> = save_resource(ResourceFormat::Binary, DEFAULT_ROOT_BLOCK, |ar| {
            let mut v = 7u32;
            ar.serialize_vle("v", &mut v)
        })
        .unwrap();
        assert_eq!(bytes, b"\0RLB\x07");
    }
}
