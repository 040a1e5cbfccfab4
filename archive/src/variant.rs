//! Archiving of [`Variant`] values.
//!
//! The value type is serialized separately from the value so callers can
//! pack it (attribute prefabs store it in a header byte in binary
//! archives). Text archives write math types as space-separated strings
//! (`"1 2 3"`); binary archives write their raw components.

use std::collections::BTreeMap;

use redlilium_core::{ResourceRef, StringHash, Variant, VariantType};

use crate::archive::Archive;
use crate::error::ArchiveError;

/// Serializes a variant type, as its name in text archives and as a byte
/// in binary archives.
pub fn serialize_variant_type(
    ar: &mut dyn Archive,
    name: &str,
    ty: &mut VariantType,
) -> Result<(), ArchiveError> {
    if ar.is_human_readable() {
        let mut type_name = ty.name().to_owned();
        ar.serialize_string(name, &mut type_name)?;
        *ty = VariantType::from_name(&type_name).ok_or_else(|| {
            ArchiveError::invalid_value(name, format!("unknown variant type '{type_name}'"))
        })?;
    } else {
        let mut raw = *ty as u8;
        ar.serialize_u8(name, &mut raw)?;
        *ty = VariantType::from_u8(raw).ok_or_else(|| {
            ArchiveError::invalid_value(name, format!("unknown variant type {raw}"))
        })?;
    }
    Ok(())
}

/// Serializes `value` as type `ty`.
///
/// On output `ty` must be `value.variant_type()`. On input `value` is
/// replaced by a value of type `ty`.
pub fn serialize_variant_value(
    ar: &mut dyn Archive,
    name: &str,
    ty: VariantType,
    value: &mut Variant,
) -> Result<(), ArchiveError> {
    if !ar.is_input() && value.variant_type() != ty {
        return Err(ArchiveError::invalid_value(
            name,
            format!("value of type {} written as {ty}", value.variant_type()),
        ));
    }
    if ar.is_input() {
        *value = Variant::default_for(ty);
    }

    match value {
        Variant::None => Ok(()),
        Variant::Bool(v) => ar.serialize_bool(name, v),
        Variant::Int(v) => ar.serialize_i32(name, v),
        Variant::Int64(v) => ar.serialize_i64(name, v),
        Variant::Float(v) => ar.serialize_f32(name, v),
        Variant::Double(v) => ar.serialize_f64(name, v),
        Variant::String(v) => ar.serialize_string(name, v),
        Variant::Vector2(v) => serialize_floats(ar, name, v),
        Variant::Vector3(v) => serialize_floats(ar, name, v),
        Variant::Vector4(v) | Variant::Quaternion(v) | Variant::Color(v) => {
            serialize_floats(ar, name, v)
        }
        Variant::IntVector2(v) => serialize_ints(ar, name, v),
        Variant::IntVector3(v) => serialize_ints(ar, name, v),
        Variant::Buffer(v) => ar.serialize_bytes(name, v),
        Variant::ResourceRef(v) => serialize_resource_ref(ar, name, v),
        Variant::StringVector(v) => serialize_string_vector(ar, name, v),
        Variant::VariantVector(v) => serialize_variant_vector(ar, name, v),
        Variant::VariantMap(v) => serialize_variant_map(ar, name, v),
    }
}

/// Serializes a self-describing variant as `type` and `value` elements of
/// the current block.
pub fn serialize_variant_in_block(
    ar: &mut dyn Archive,
    value: &mut Variant,
) -> Result<(), ArchiveError> {
    let mut ty = value.variant_type();
    serialize_variant_type(ar, "type", &mut ty)?;
    serialize_variant_value(ar, "value", ty, value)
}

fn format_components<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_components<T, const N: usize>(name: &str, text: &str) -> Result<[T; N], ArchiveError>
where
    T: std::str::FromStr + Copy + Default,
{
    let mut out = [T::default(); N];
    let mut parts = text.split_whitespace();
    for slot in out.iter_mut() {
        *slot = parts
            .next()
            .and_then(|part| part.parse().ok())
            .ok_or_else(|| {
                ArchiveError::invalid_value(name, format!("'{text}' is not {N} numbers"))
            })?;
    }
    if parts.next().is_some() {
        return Err(ArchiveError::invalid_value(
            name,
            format!("'{text}' has more than {N} numbers"),
        ));
    }
    Ok(out)
}

fn serialize_floats<const N: usize>(
    ar: &mut dyn Archive,
    name: &str,
    values: &mut [f32; N],
) -> Result<(), ArchiveError> {
    if ar.is_human_readable() {
        let mut text = format_components(&values[..]);
        ar.serialize_string(name, &mut text)?;
        *values = parse_components(name, &text)?;
    } else {
        for v in values.iter_mut() {
            ar.serialize_f32(name, v)?;
        }
    }
    Ok(())
}

fn serialize_ints<const N: usize>(
    ar: &mut dyn Archive,
    name: &str,
    values: &mut [i32; N],
) -> Result<(), ArchiveError> {
    if ar.is_human_readable() {
        let mut text = format_components(&values[..]);
        ar.serialize_string(name, &mut text)?;
        *values = parse_components(name, &text)?;
    } else {
        for v in values.iter_mut() {
            ar.serialize_i32(name, v)?;
        }
    }
    Ok(())
}

fn serialize_resource_ref(
    ar: &mut dyn Archive,
    name: &str,
    value: &mut ResourceRef,
) -> Result<(), ArchiveError> {
    ar.begin_unordered_block(name)?;
    let mut type_hash = value.type_hash.value();
    ar.serialize_u32("type", &mut type_hash)?;
    value.type_hash = StringHash(type_hash);
    ar.serialize_string("name", &mut value.name)?;
    ar.end_block()
}

fn serialize_string_vector(
    ar: &mut dyn Archive,
    name: &str,
    values: &mut Vec<String>,
) -> Result<(), ArchiveError> {
    let len = ar.begin_array_block(name, values.len())?;
    if ar.is_input() {
        values.clear();
        for _ in 0..len {
            let mut v = String::new();
            ar.serialize_string("value", &mut v)?;
            values.push(v);
        }
    } else {
        for v in values.iter_mut() {
            ar.serialize_string("value", v)?;
        }
    }
    ar.end_block()
}

fn serialize_variant_vector(
    ar: &mut dyn Archive,
    name: &str,
    values: &mut Vec<Variant>,
) -> Result<(), ArchiveError> {
    let len = ar.begin_array_block(name, values.len())?;
    if ar.is_input() {
        values.clear();
        for _ in 0..len {
            let mut v = Variant::None;
            ar.begin_unordered_block("value")?;
            serialize_variant_in_block(ar, &mut v)?;
            ar.end_block()?;
            values.push(v);
        }
    } else {
        for v in values.iter_mut() {
            ar.begin_unordered_block("value")?;
            serialize_variant_in_block(ar, v)?;
            ar.end_block()?;
        }
    }
    ar.end_block()
}

fn serialize_variant_map(
    ar: &mut dyn Archive,
    name: &str,
    values: &mut BTreeMap<String, Variant>,
) -> Result<(), ArchiveError> {
    let len = ar.begin_array_block(name, values.len())?;
    if ar.is_input() {
        values.clear();
        for _ in 0..len {
            let mut key = String::new();
            let mut value = Variant::None;
            ar.begin_unordered_block("value")?;
            ar.serialize_string("key", &mut key)?;
            serialize_variant_in_block(ar, &mut value)?;
            ar.end_block()?;
            values.insert(key, value);
        }
    } else {
        for (key, value) in values.iter_mut() {
            let mut key = key.clone();
            ar.begin_unordered_block("value")?;
            ar.serialize_string("key", &mut key)?;
            serialize_variant_in_block(ar, value)?;
            ar.end_block()?;
        }
    }
    ar.end_block()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{BinaryInputArchive, BinaryOutputArchive};
    use crate::json::{JsonInputArchive, JsonOutputArchive};

    #[test]
    fn math_types_are_strings_in_json() {
        let mut ar = JsonOutputArchive::new();
        ar.begin_unordered_block("root").unwrap();
        let mut value = Variant::Vector3([1.0, 2.5, -3.0]);
        serialize_variant_in_block(&mut ar, &mut value).unwrap();
        ar.end_block().unwrap();

        let doc = ar.into_value().unwrap();
        assert_eq!(
            doc,
            serde_json::json!({ "type": "Vector3", "value": "1 2.5 -3" })
        );

        let mut input = JsonInputArchive::new(&doc);
        input.begin_unordered_block("root").unwrap();
        let mut back = Variant::None;
        serialize_variant_in_block(&mut input, &mut back).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn math_types_are_raw_in_binary() {
        let mut ar = BinaryOutputArchive::new();
        let mut value = Variant::IntVector2([2, 3]);
        serialize_variant_value(&mut ar, "value", VariantType::IntVector2, &mut value).unwrap();
        let bytes = ar.into_bytes().unwrap();
        assert_eq!(bytes.len(), 8);

        let mut input = BinaryInputArchive::new(&bytes);
        let mut back = Variant::None;
        serialize_variant_value(&mut input, "value", VariantType::IntVector2, &mut back).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn nested_collections_survive_json() {
        let mut map = BTreeMap::new();
        map.insert("speed".to_owned(), Variant::Float(4.0));
        map.insert(
            "tags".to_owned(),
            Variant::StringVector(vec!["a".into(), "b".into()]),
        );
        let mut value = Variant::VariantVector(vec![
            Variant::VariantMap(map),
            Variant::ResourceRef(ResourceRef::new("Model", "Models/Box.mdl")),
            Variant::None,
        ]);

        let mut ar = JsonOutputArchive::new();
        ar.begin_unordered_block("root").unwrap();
        serialize_variant_in_block(&mut ar, &mut value).unwrap();
        ar.end_block().unwrap();
        let doc = ar.into_value().unwrap();

        let mut input = JsonInputArchive::new(&doc);
        input.begin_unordered_block("root").unwrap();
        let mut back = Variant::None;
        serialize_variant_in_block(&mut input, &mut back).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn wrong_component_count_is_rejected() {
        let doc = serde_json::json!({ "type": "Vector3", "value": "1 2" });
        let mut input = JsonInputArchive::new(&doc);
        input.begin_unordered_block("root").unwrap();
        let mut back = Variant::None;
        assert!(matches!(
            serialize_variant_in_block(&mut input, &mut back),
            Err(ArchiveError::InvalidValue { .. })
        ));
    }

    #[test]
    fn unknown_type_name_is_rejected() {
        let doc = serde_json::json!({ "type": "Matrix3", "value": "" });
        let mut input = JsonInputArchive::new(&doc);
        input.begin_unordered_block("root").unwrap();
        let mut back = Variant::None;
        assert!(serialize_variant_in_block(&mut input, &mut back).is_err());
    }

    #[test]
    fn mismatched_output_type_is_rejected() {
        let mut ar = BinaryOutputArchive::new();
        let mut value = Variant::Bool(true);
        assert!(serialize_variant_value(&mut ar, "value", VariantType::Int, &mut value).is_err());
    }
}
