//! Compact binary archives.
//!
//! Layout rules:
//!
//! - element names are not stored; elements are read back in write order
//! - unordered blocks add no bytes
//! - array blocks are prefixed with their element count (VLE)
//! - integers and floats are little-endian, `bool` and `u8` take one byte
//! - strings and byte buffers are a VLE length followed by raw bytes
//!
//! VLE is LEB128: seven bits per byte, least significant group first, high
//! bit set on every byte but the last. Values below 128 take one byte.

use crate::archive::Archive;
use crate::error::ArchiveError;

/// Maximum encoded size of a `u32` in VLE.
const MAX_VLE_BYTES: usize = 5;

/// Appends the VLE encoding of `value`.
pub fn write_vle(buf: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Returns the number of bytes [`write_vle`] emits for `value`.
pub fn vle_size(value: u32) -> usize {
    match value {
        0..=0x7f => 1,
        0x80..=0x3fff => 2,
        0x4000..=0x1f_ffff => 3,
        0x20_0000..=0x0fff_ffff => 4,
        _ => 5,
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Writes a binary block stream into a byte buffer.
#[derive(Debug, Default)]
pub struct BinaryOutputArchive {
    buf: Vec<u8>,
    depth: usize,
}

impl BinaryOutputArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an archive whose output starts with `prefix`.
    pub fn with_prefix(prefix: &[u8]) -> Self {
        Self {
            buf: prefix.to_vec(),
            depth: 0,
        }
    }

    /// Returns the bytes written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the archive and returns the written bytes.
    pub fn into_bytes(self) -> Result<Vec<u8>, ArchiveError> {
        if self.depth != 0 {
            return Err(ArchiveError::UnbalancedBlock(format!(
                "{} blocks left open",
                self.depth
            )));
        }
        Ok(self.buf)
    }

    fn write_len(&mut self, len: usize, name: &str) -> Result<(), ArchiveError> {
        let len = u32::try_from(len)
            .map_err(|_| ArchiveError::invalid_value(name, "length does not fit into u32"))?;
        write_vle(&mut self.buf, len);
        Ok(())
    }
}

impl Archive for BinaryOutputArchive {
    fn is_input(&self) -> bool {
        false
    }

    fn is_human_readable(&self) -> bool {
        false
    }

    fn is_unordered_access_supported(&self) -> bool {
        false
    }

    fn has_element(&self, _name: &str) -> bool {
        false
    }

    fn begin_unordered_block(&mut self, _name: &str) -> Result<(), ArchiveError> {
        self.depth += 1;
        Ok(())
    }

    fn begin_array_block(&mut self, name: &str, size_hint: usize) -> Result<usize, ArchiveError> {
        self.write_len(size_hint, name)?;
        self.depth += 1;
        Ok(size_hint)
    }

    fn end_block(&mut self) -> Result<(), ArchiveError> {
        if self.depth == 0 {
            return Err(ArchiveError::UnbalancedBlock("no open block to close".into()));
        }
        self.depth -= 1;
        Ok(())
    }

    fn serialize_bool(&mut self, _name: &str, value: &mut bool) -> Result<(), ArchiveError> {
        self.buf.push(u8::from(*value));
        Ok(())
    }

    fn serialize_u8(&mut self, _name: &str, value: &mut u8) -> Result<(), ArchiveError> {
        self.buf.push(*value);
        Ok(())
    }

    fn serialize_i32(&mut self, _name: &str, value: &mut i32) -> Result<(), ArchiveError> {
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn serialize_u32(&mut self, _name: &str, value: &mut u32) -> Result<(), ArchiveError> {
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn serialize_i64(&mut self, _name: &str, value: &mut i64) -> Result<(), ArchiveError> {
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn serialize_u64(&mut self, _name: &str, value: &mut u64) -> Result<(), ArchiveError> {
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn serialize_f32(&mut self, _name: &str, value: &mut f32) -> Result<(), ArchiveError> {
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn serialize_f64(&mut self, _name: &str, value: &mut f64) -> Result<(), ArchiveError> {
        self.buf.extend_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn serialize_string(&mut self, name: &str, value: &mut String) -> Result<(), ArchiveError> {
        self.write_len(value.len(), name)?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn serialize_bytes(&mut self, name: &str, value: &mut Vec<u8>) -> Result<(), ArchiveError> {
        self.write_len(value.len(), name)?;
        self.buf.extend_from_slice(value);
        Ok(())
    }

    fn serialize_vle(&mut self, _name: &str, value: &mut u32) -> Result<(), ArchiveError> {
        write_vle(&mut self.buf, *value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Reads a binary block stream from a byte slice.
#[derive(Debug)]
pub struct BinaryInputArchive<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> BinaryInputArchive<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
        }
    }

    /// Current read offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns `true` once every byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos == self.data.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ArchiveError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(ArchiveError::UnexpectedEof { offset: self.pos })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ArchiveError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_vle(&mut self, name: &str) -> Result<u32, ArchiveError> {
        let mut value: u32 = 0;
        for i in 0..MAX_VLE_BYTES {
            let [byte] = self.take_array::<1>()?;
            let group = u32::from(byte & 0x7f);
            if i == MAX_VLE_BYTES - 1 && group > 0x0f {
                return Err(ArchiveError::invalid_value(name, "VLE value overflows u32"));
            }
            value |= group << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ArchiveError::invalid_value(name, "VLE value is too long"))
    }

    fn read_len(&mut self, name: &str) -> Result<usize, ArchiveError> {
        Ok(self.read_vle(name)? as usize)
    }
}

impl Archive for BinaryInputArchive<'_> {
    fn is_input(&self) -> bool {
        true
    }

    fn is_human_readable(&self) -> bool {
        false
    }

    fn is_unordered_access_supported(&self) -> bool {
        false
    }

    fn has_element(&self, _name: &str) -> bool {
        false
    }

    fn begin_unordered_block(&mut self, _name: &str) -> Result<(), ArchiveError> {
        self.depth += 1;
        Ok(())
    }

    /// Every element of an array takes at least one byte, so a count larger
    /// than the remaining input is rejected before anything is allocated.
    fn begin_array_block(&mut self, name: &str, _size_hint: usize) -> Result<usize, ArchiveError> {
        let offset = self.pos;
        let len = self.read_len(name)?;
        if len > self.data.len() - self.pos {
            return Err(ArchiveError::invalid_value(
                name,
                format!("array of {len} elements at offset {offset} exceeds the remaining input"),
            ));
        }
        self.depth += 1;
        Ok(len)
    }

    fn end_block(&mut self) -> Result<(), ArchiveError> {
        if self.depth == 0 {
            return Err(ArchiveError::UnbalancedBlock("no open block to close".into()));
        }
        self.depth -= 1;
        Ok(())
    }

    fn serialize_bool(&mut self, name: &str, value: &mut bool) -> Result<(), ArchiveError> {
        let [byte] = self.take_array::<1>()?;
        *value = match byte {
            0 => false,
            1 => true,
            other => {
                return Err(ArchiveError::invalid_value(
                    name,
                    format!("bool byte {other} is neither 0 nor 1"),
                ));
            }
        };
        Ok(())
    }

    fn serialize_u8(&mut self, _name: &str, value: &mut u8) -> Result<(), ArchiveError> {
        let [byte] = self.take_array::<1>()?;
        *value = byte;
        Ok(())
    }

    fn serialize_i32(&mut self, _name: &str, value: &mut i32) -> Result<(), ArchiveError> {
        *value = i32::from_le_bytes(self.take_array()?);
        Ok(())
    }

    fn serialize_u32(&mut self, _name: &str, value: &mut u32) -> Result<(), ArchiveError> {
        *value = u32::from_le_bytes(self.take_array()?);
        Ok(())
    }

    fn serialize_i64(&mut self, _name: &str, value: &mut i64) -> Result<(), ArchiveError> {
        *value = i64::from_le_bytes(self.take_array()?);
        Ok(())
    }

    fn serialize_u64(&mut self, _name: &str, value: &mut u64) -> Result<(), ArchiveError> {
        *value = u64::from_le_bytes(self.take_array()?);
        Ok(())
    }

    fn serialize_f32(&mut self, _name: &str, value: &mut f32) -> Result<(), ArchiveError> {
        *value = f32::from_le_bytes(self.take_array()?);
        Ok(())
    }

    fn serialize_f64(&mut self, _name: &str, value: &mut f64) -> Result<(), ArchiveError> {
        *value = f64::from_le_bytes(self.take_array()?);
        Ok(())
    }

    fn serialize_string(&mut self, name: &str, value: &mut String) -> Result<(), ArchiveError> {
        let len = self.read_len(name)?;
        let bytes = self.take(len)?;
        *value = std::str::from_utf8(bytes)
            .map_err(|e| ArchiveError::invalid_value(name, e.to_string()))?
            .to_owned();
        Ok(())
    }

    fn serialize_bytes(&mut self, name: &str, value: &mut Vec<u8>) -> Result<(), ArchiveError> {
        let len = self.read_len(name)?;
        *value = self.take(len)?.to_vec();
        Ok(())
    }

    fn serialize_vle(&mut self, name: &str, value: &mut u32) -> Result<(), ArchiveError> {
        *value = self.read_vle(name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_vle(value: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        write_vle(&mut buf, value);
        buf
    }

    #[test]
    fn vle_sizes_match_boundaries() {
        for (value, size) in [
            (0, 1),
            (127, 1),
            (128, 2),
            (16_383, 2),
            (16_384, 3),
            (2_097_151, 3),
            (2_097_152, 4),
            (u32::MAX, 5),
        ] {
            assert_eq!(encode_vle(value).len(), size, "value {value}");
            assert_eq!(vle_size(value), size, "value {value}");
        }
    }

    #[test]
    fn vle_decodes_what_it_encodes() {
        for value in [0, 1, 300, 20_340, 3_123_456, u32::MAX] {
            let bytes = encode_vle(value);
            let mut ar = BinaryInputArchive::new(&bytes);
            let mut decoded = 0;
            ar.serialize_vle("v", &mut decoded).unwrap();
            assert_eq!(decoded, value);
            assert!(ar.is_exhausted());
        }
    }

    #[test]
    fn vle_overflow_is_rejected() {
        let bytes = [0xff, 0xff, 0xff, 0xff, 0x7f];
        let mut ar = BinaryInputArchive::new(&bytes);
        let mut value = 0;
        assert!(matches!(
            ar.serialize_vle("v", &mut value),
            Err(ArchiveError::InvalidValue { .. })
        ));
    }

    #[test]
    fn truncated_input_reports_offset() {
        let bytes = [1, 2];
        let mut ar = BinaryInputArchive::new(&bytes);
        let mut value = 0u32;
        assert!(matches!(
            ar.serialize_u32("v", &mut value),
            Err(ArchiveError::UnexpectedEof { offset: 0 })
        ));
    }

    #[test]
    fn array_block_writes_count() {
        let mut ar = BinaryOutputArchive::new();
        assert_eq!(ar.begin_array_block("items", 3).unwrap(), 3);
        for mut i in 0u8..3 {
            ar.serialize_u8("item", &mut i).unwrap();
        }
        ar.end_block().unwrap();
        assert_eq!(ar.into_bytes().unwrap(), vec![3, 0, 1, 2]);
    }

    #[test]
    fn array_count_beyond_input_is_rejected() {
        let bytes = [0xff, 0xff, 0xff, 0xff, 0x0f, 1, 2];
        let mut ar = BinaryInputArchive::new(&bytes);
        assert!(matches!(
            ar.begin_array_block("items", 0),
            Err(ArchiveError::InvalidValue { .. })
        ));

        let bytes = [2, 7, 8];
        let mut ar = BinaryInputArchive::new(&bytes);
        assert_eq!(ar.begin_array_block("items", 0).unwrap(), 2);
    }

    #[test]
    fn unordered_blocks_are_free() {
        let mut ar = BinaryOutputArchive::new();
        ar.begin_unordered_block("outer").unwrap();
        ar.begin_unordered_block("inner").unwrap();
        ar.end_block().unwrap();
        ar.end_block().unwrap();
        assert!(ar.into_bytes().unwrap().is_empty());
    }

    #[test]
    fn unbalanced_blocks_are_errors() {
        let mut ar = BinaryOutputArchive::new();
        assert!(ar.end_block().is_err());
        ar.begin_unordered_block("open").unwrap();
        assert!(ar.into_bytes().is_err());
    }

    #[test]
    fn invalid_bool_byte() {
        let bytes = [2];
        let mut ar = BinaryInputArchive::new(&bytes);
        let mut value = false;
        assert!(ar.serialize_bool("flag", &mut value).is_err());
    }

    #[test]
    fn strings_are_length_prefixed() {
        let mut ar = BinaryOutputArchive::new();
        let mut s = String::from("foo");
        ar.serialize_string("name", &mut s).unwrap();
        let bytes = ar.into_bytes().unwrap();
        assert_eq!(bytes, b"\x03foo");

        let mut input = BinaryInputArchive::new(&bytes);
        let mut back = String::new();
        input.serialize_string("name", &mut back).unwrap();
        assert_eq!(back, "foo");
    }
}
