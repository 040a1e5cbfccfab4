//! JSON archives backed by [`serde_json::Value`].
//!
//! Unordered blocks map to objects and array blocks to arrays. The name of
//! the outermost block is not stored: its object is the document root.
//! Element names inside arrays are ignored. Byte buffers are base64 strings.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, Value};

use crate::archive::Archive;
use crate::error::ArchiveError;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

enum OutputFrame {
    Object {
        name: String,
        map: Map<String, Value>,
    },
    Array {
        name: String,
        items: Vec<Value>,
        expected: usize,
    },
}

/// Builds a JSON document.
#[derive(Default)]
pub struct JsonOutputArchive {
    stack: Vec<OutputFrame>,
    root: Option<Value>,
}

impl JsonOutputArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the archive and returns the document.
    pub fn into_value(self) -> Result<Value, ArchiveError> {
        if !self.stack.is_empty() {
            return Err(ArchiveError::UnbalancedBlock(format!(
                "{} blocks left open",
                self.stack.len()
            )));
        }
        self.root
            .ok_or_else(|| ArchiveError::UnbalancedBlock("no root block was written".into()))
    }

    /// Consumes the archive and returns the document as pretty-printed text.
    pub fn into_string(self) -> Result<String, ArchiveError> {
        Ok(serde_json::to_string_pretty(&self.into_value()?)?)
    }

    fn emit(&mut self, name: &str, value: Value) -> Result<(), ArchiveError> {
        match self.stack.last_mut() {
            Some(OutputFrame::Object { map, .. }) => {
                map.insert(name.to_owned(), value);
                Ok(())
            }
            Some(OutputFrame::Array { items, .. }) => {
                items.push(value);
                Ok(())
            }
            None if self.root.is_none() => {
                self.root = Some(value);
                Ok(())
            }
            None => Err(ArchiveError::UnbalancedBlock(format!(
                "element '{name}' written after the root block was closed"
            ))),
        }
    }

    fn begin(&mut self, frame: OutputFrame) -> Result<(), ArchiveError> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(ArchiveError::UnbalancedBlock(
                "archive already has a root block".into(),
            ));
        }
        self.stack.push(frame);
        Ok(())
    }
}

/// JSON numbers cannot hold non-finite values, so those are written as the
/// strings `"inf"`, `"-inf"` and `"NaN"`.
fn float_value(v: f64) -> Value {
    match serde_json::Number::from_f64(v) {
        Some(number) => Value::Number(number),
        None if v.is_nan() => Value::String("NaN".into()),
        None if v > 0.0 => Value::String("inf".into()),
        None => Value::String("-inf".into()),
    }
}

impl Archive for JsonOutputArchive {
    fn is_input(&self) -> bool {
        false
    }

    fn is_human_readable(&self) -> bool {
        true
    }

    fn is_unordered_access_supported(&self) -> bool {
        true
    }

    fn has_element(&self, _name: &str) -> bool {
        false
    }

    fn begin_unordered_block(&mut self, name: &str) -> Result<(), ArchiveError> {
        self.begin(OutputFrame::Object {
            name: name.to_owned(),
            map: Map::new(),
        })
    }

    fn begin_array_block(&mut self, name: &str, size_hint: usize) -> Result<usize, ArchiveError> {
        self.begin(OutputFrame::Array {
            name: name.to_owned(),
            items: Vec::with_capacity(size_hint),
            expected: size_hint,
        })?;
        Ok(size_hint)
    }

    fn end_block(&mut self) -> Result<(), ArchiveError> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| ArchiveError::UnbalancedBlock("no open block to close".into()))?;
        let (name, value) = match frame {
            OutputFrame::Object { name, map } => (name, Value::Object(map)),
            OutputFrame::Array {
                name,
                items,
                expected,
            } => {
                if items.len() != expected {
                    return Err(ArchiveError::ArraySizeMismatch {
                        block: name,
                        expected,
                        actual: items.len(),
                    });
                }
                (name, Value::Array(items))
            }
        };
        self.emit(&name, value)
    }

    fn serialize_bool(&mut self, name: &str, value: &mut bool) -> Result<(), ArchiveError> {
        self.emit(name, Value::Bool(*value))
    }

    fn serialize_u8(&mut self, name: &str, value: &mut u8) -> Result<(), ArchiveError> {
        self.emit(name, Value::from(*value))
    }

    fn serialize_i32(&mut self, name: &str, value: &mut i32) -> Result<(), ArchiveError> {
        self.emit(name, Value::from(*value))
    }

    fn serialize_u32(&mut self, name: &str, value: &mut u32) -> Result<(), ArchiveError> {
        self.emit(name, Value::from(*value))
    }

    fn serialize_i64(&mut self, name: &str, value: &mut i64) -> Result<(), ArchiveError> {
        self.emit(name, Value::from(*value))
    }

    fn serialize_u64(&mut self, name: &str, value: &mut u64) -> Result<(), ArchiveError> {
        self.emit(name, Value::from(*value))
    }

    fn serialize_f32(&mut self, name: &str, value: &mut f32) -> Result<(), ArchiveError> {
        self.emit(name, float_value(f64::from(*value)))
    }

    fn serialize_f64(&mut self, name: &str, value: &mut f64) -> Result<(), ArchiveError> {
        self.emit(name, float_value(*value))
    }

    fn serialize_string(&mut self, name: &str, value: &mut String) -> Result<(), ArchiveError> {
        self.emit(name, Value::String(value.clone()))
    }

    fn serialize_bytes(&mut self, name: &str, value: &mut Vec<u8>) -> Result<(), ArchiveError> {
        self.emit(name, Value::String(BASE64.encode(value)))
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

enum InputFrame<'a> {
    Object {
        name: String,
        map: &'a Map<String, Value>,
    },
    Array {
        name: String,
        items: &'a [Value],
        next: usize,
    },
}

/// Reads a JSON document.
pub struct JsonInputArchive<'a> {
    root: &'a Value,
    root_consumed: bool,
    stack: Vec<InputFrame<'a>>,
}

impl<'a> JsonInputArchive<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            root_consumed: false,
            stack: Vec::new(),
        }
    }

    fn next_value(&mut self, name: &str) -> Result<&'a Value, ArchiveError> {
        match self.stack.last_mut() {
            Some(InputFrame::Object { name: block, map }) => {
                let map: &'a Map<String, Value> = *map;
                map.get(name).ok_or_else(|| ArchiveError::ElementNotFound {
                    name: name.to_owned(),
                    block: block.clone(),
                })
            }
            Some(InputFrame::Array {
                name: block,
                items,
                next,
            }) => {
                let items: &'a [Value] = *items;
                let value = items.get(*next).ok_or_else(|| ArchiveError::ArrayOverrun {
                    block: block.clone(),
                })?;
                *next += 1;
                Ok(value)
            }
            None if !self.root_consumed => {
                self.root_consumed = true;
                Ok(self.root)
            }
            None => Err(ArchiveError::UnbalancedBlock(format!(
                "element '{name}' read after the root block was closed"
            ))),
        }
    }

    fn unexpected(name: &str, expected: &str, found: &Value) -> ArchiveError {
        ArchiveError::invalid_value(name, format!("expected {expected}, found {found}"))
    }

    fn read_i64(&mut self, name: &str) -> Result<i64, ArchiveError> {
        let value = self.next_value(name)?;
        value
            .as_i64()
            .ok_or_else(|| Self::unexpected(name, "integer", value))
    }

    fn read_u64(&mut self, name: &str) -> Result<u64, ArchiveError> {
        let value = self.next_value(name)?;
        value
            .as_u64()
            .ok_or_else(|| Self::unexpected(name, "unsigned integer", value))
    }

    fn read_f64(&mut self, name: &str) -> Result<f64, ArchiveError> {
        let value = self.next_value(name)?;
        match value {
            Value::Null => Ok(f64::NAN),
            Value::String(text) => match text.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "NaN" => Ok(f64::NAN),
                _ => Err(Self::unexpected(name, "number", value)),
            },
            _ => value
                .as_f64()
                .ok_or_else(|| Self::unexpected(name, "number", value)),
        }
    }

    fn read_str(&mut self, name: &str) -> Result<&'a str, ArchiveError> {
        let value = self.next_value(name)?;
        value
            .as_str()
            .ok_or_else(|| Self::unexpected(name, "string", value))
    }
}

fn narrow<T: TryFrom<i128>>(name: &str, value: i128) -> Result<T, ArchiveError> {
    T::try_from(value)
        .map_err(|_| ArchiveError::invalid_value(name, format!("{value} is out of range")))
}

impl Archive for JsonInputArchive<'_> {
    fn is_input(&self) -> bool {
        true
    }

    fn is_human_readable(&self) -> bool {
        true
    }

    fn is_unordered_access_supported(&self) -> bool {
        true
    }

    fn has_element(&self, name: &str) -> bool {
        match self.stack.last() {
            Some(InputFrame::Object { map, .. }) => map.contains_key(name),
            Some(InputFrame::Array { items, next, .. }) => *next < items.len(),
            None => !self.root_consumed,
        }
    }

    fn begin_unordered_block(&mut self, name: &str) -> Result<(), ArchiveError> {
        let value = self.next_value(name)?;
        let map = value
            .as_object()
            .ok_or_else(|| Self::unexpected(name, "object", value))?;
        self.stack.push(InputFrame::Object {
            name: name.to_owned(),
            map,
        });
        Ok(())
    }

    fn begin_array_block(&mut self, name: &str, _size_hint: usize) -> Result<usize, ArchiveError> {
        let value = self.next_value(name)?;
        let items = value
            .as_array()
            .ok_or_else(|| Self::unexpected(name, "array", value))?;
        self.stack.push(InputFrame::Array {
            name: name.to_owned(),
            items,
            next: 0,
        });
        Ok(items.len())
    }

    fn end_block(&mut self) -> Result<(), ArchiveError> {
        self.stack
            .pop()
            .map(|_| ())
            .ok_or_else(|| ArchiveError::UnbalancedBlock("no open block to close".into()))
    }

    fn serialize_bool(&mut self, name: &str, value: &mut bool) -> Result<(), ArchiveError> {
        let json = self.next_value(name)?;
        *value = json
            .as_bool()
            .ok_or_else(|| Self::unexpected(name, "bool", json))?;
        Ok(())
    }

    fn serialize_u8(&mut self, name: &str, value: &mut u8) -> Result<(), ArchiveError> {
        *value = narrow(name, i128::from(self.read_u64(name)?))?;
        Ok(())
    }

    fn serialize_i32(&mut self, name: &str, value: &mut i32) -> Result<(), ArchiveError> {
        *value = narrow(name, i128::from(self.read_i64(name)?))?;
        Ok(())
    }

    fn serialize_u32(&mut self, name: &str, value: &mut u32) -> Result<(), ArchiveError> {
        *value = narrow(name, i128::from(self.read_u64(name)?))?;
        Ok(())
    }

    fn serialize_i64(&mut self, name: &str, value: &mut i64) -> Result<(), ArchiveError> {
        *value = self.read_i64(name)?;
        Ok(())
    }

    fn serialize_u64(&mut self, name: &str, value: &mut u64) -> Result<(), ArchiveError> {
        *value = self.read_u64(name)?;
        Ok(())
    }

    fn serialize_f32(&mut self, name: &str, value: &mut f32) -> Result<(), ArchiveError> {
        *value = self.read_f64(name)? as f32;
        Ok(())
    }

    fn serialize_f64(&mut self, name: &str, value: &mut f64) -> Result<(), ArchiveError> {
        *value = self.read_f64(name)?;
        Ok(())
    }

    fn serialize_string(&mut self, name: &str, value: &mut String) -> Result<(), ArchiveError> {
        *value = self.read_str(name)?.to_owned();
        Ok(())
    }

    fn serialize_bytes(&mut self, name: &str, value: &mut Vec<u8>) -> Result<(), ArchiveError> {
        let encoded = self.read_str(name)?;
        *value = BASE64
            .decode(encoded)
            .map_err(|e| ArchiveError::invalid_value(name, e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_block_is_document() {
        let mut ar = JsonOutputArchive::new();
        ar.begin_unordered_block("attribute").unwrap();
        let mut id = 11u32;
        ar.serialize_u32("id", &mut id).unwrap();
        ar.end_block().unwrap();
        assert_eq!(ar.into_value().unwrap(), serde_json::json!({ "id": 11 }));
    }

    #[test]
    fn arrays_ignore_element_names() {
        let mut ar = JsonOutputArchive::new();
        ar.begin_unordered_block("root").unwrap();
        ar.begin_array_block("values", 2).unwrap();
        for mut v in [1i32, 2] {
            ar.serialize_i32("value", &mut v).unwrap();
        }
        ar.end_block().unwrap();
        ar.end_block().unwrap();
        assert_eq!(
            ar.into_value().unwrap(),
            serde_json::json!({ "values": [1, 2] })
        );
    }

    #[test]
    fn array_size_must_match_hint() {
        let mut ar = JsonOutputArchive::new();
        ar.begin_unordered_block("root").unwrap();
        ar.begin_array_block("values", 2).unwrap();
        let mut v = 1;
        ar.serialize_i32("value", &mut v).unwrap();
        assert!(matches!(
            ar.end_block(),
            Err(ArchiveError::ArraySizeMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn non_finite_floats_survive() {
        let mut ar = JsonOutputArchive::new();
        ar.begin_unordered_block("root").unwrap();
        for (name, mut v) in [("a", f32::INFINITY), ("b", f32::NEG_INFINITY), ("c", f32::NAN)] {
            ar.serialize_f32(name, &mut v).unwrap();
        }
        let mut d = 0.5f64;
        ar.serialize_f64("d", &mut d).unwrap();
        ar.end_block().unwrap();
        let doc = ar.into_value().unwrap();
        assert_eq!(
            doc,
            serde_json::json!({ "a": "inf", "b": "-inf", "c": "NaN", "d": 0.5 })
        );

        let mut input = JsonInputArchive::new(&doc);
        input.begin_unordered_block("root").unwrap();
        let mut a = 0.0f32;
        let mut b = 0.0f32;
        let mut c = 0.0f32;
        input.serialize_f32("a", &mut a).unwrap();
        input.serialize_f32("b", &mut b).unwrap();
        input.serialize_f32("c", &mut c).unwrap();
        assert_eq!(a, f32::INFINITY);
        assert_eq!(b, f32::NEG_INFINITY);
        assert!(c.is_nan());
    }

    #[test]
    fn float_from_other_string_is_an_error() {
        let doc = serde_json::json!({ "x": "fast" });
        let mut ar = JsonInputArchive::new(&doc);
        ar.begin_unordered_block("root").unwrap();
        let mut x = 0.0f32;
        assert!(ar.serialize_f32("x", &mut x).is_err());
    }

    #[test]
    fn input_looks_up_by_name() {
        let doc = serde_json::json!({ "b": "text", "a": true });
        let mut ar = JsonInputArchive::new(&doc);
        ar.begin_unordered_block("root").unwrap();
        assert!(ar.has_element("a"));
        assert!(!ar.has_element("c"));

        let mut a = false;
        ar.serialize_bool("a", &mut a).unwrap();
        let mut b = String::new();
        ar.serialize_string("b", &mut b).unwrap();
        assert!(a);
        assert_eq!(b, "text");

        let mut missing = 0u32;
        assert!(matches!(
            ar.serialize_u32("c", &mut missing),
            Err(ArchiveError::ElementNotFound { .. })
        ));
        ar.end_block().unwrap();
    }

    #[test]
    fn input_array_overrun() {
        let doc = serde_json::json!({ "values": [5] });
        let mut ar = JsonInputArchive::new(&doc);
        ar.begin_unordered_block("root").unwrap();
        assert_eq!(ar.begin_array_block("values", 0).unwrap(), 1);
        let mut v = 0i32;
        ar.serialize_i32("value", &mut v).unwrap();
        assert_eq!(v, 5);
        assert!(matches!(
            ar.serialize_i32("value", &mut v),
            Err(ArchiveError::ArrayOverrun { .. })
        ));
    }

    #[test]
    fn integer_range_is_checked() {
        let doc = serde_json::json!({ "big": 5_000_000_000u64, "neg": -1 });
        let mut ar = JsonInputArchive::new(&doc);
        ar.begin_unordered_block("root").unwrap();
        let mut v = 0u32;
        assert!(ar.serialize_u32("big", &mut v).is_err());
        assert!(ar.serialize_u32("neg", &mut v).is_err());
    }

    #[test]
    fn bytes_are_base64() {
        let mut ar = JsonOutputArchive::new();
        ar.begin_unordered_block("root").unwrap();
        let mut data = vec![0u8, 1, 2, 255];
        ar.serialize_bytes("data", &mut data).unwrap();
        ar.end_block().unwrap();
        let doc = ar.into_value().unwrap();
        assert_eq!(doc["data"], "AAEC/w==");

        let mut input = JsonInputArchive::new(&doc);
        input.begin_unordered_block("root").unwrap();
        let mut back = Vec::new();
        input.serialize_bytes("data", &mut back).unwrap();
        assert_eq!(back, data);
    }
}
