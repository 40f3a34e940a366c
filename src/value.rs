//! Value Module
//!
//! The closed set of primitive values the store accepts, and their compact
//! byte encoding.
//!
//! ## Encoding
//! ```text
//! ┌──────┬───────────────────────────────────────────────┐
//! │ Tag  │ Payload                                       │
//! ├──────┼───────────────────────────────────────────────┤
//! │ 0x00 │ Nil — none                                    │
//! │ 0x01 │ Bool(false) — none                            │
//! │ 0x02 │ Bool(true) — none                             │
//! │ 0x03 │ Int — i64 little-endian (8)                   │
//! │ 0x04 │ UInt — u64 little-endian (8)                  │
//! │ 0x05 │ Float — f64 bit pattern little-endian (8)     │
//! │ 0x06 │ Str — len: u32 (4) | UTF-8 bytes              │
//! │ 0x07 │ List — count: u32 (4) | encoded elements      │
//! │ 0x08 │ Map — count: u32 (4) | (Str key, value) pairs │
//! └──────┴───────────────────────────────────────────────┘
//! ```
//!
//! The encoding is not self-delimiting at the top level: the store's index
//! records each record's total byte length, so `decode` is always handed an
//! exact slice and rejects trailing bytes.

use crate::error::Result;
use crate::StoreError;

// =============================================================================
// Wire Tags
// =============================================================================

const TAG_NIL: u8 = 0x00;
const TAG_FALSE: u8 = 0x01;
const TAG_TRUE: u8 = 0x02;
const TAG_INT: u8 = 0x03;
const TAG_UINT: u8 = 0x04;
const TAG_FLOAT: u8 = 0x05;
const TAG_STR: u8 = 0x06;
const TAG_LIST: u8 = 0x07;
const TAG_MAP: u8 = 0x08;

// =============================================================================
// Value
// =============================================================================

/// A primitive value storable in a mmapkv file.
///
/// This is a deliberately closed set: numbers, booleans, text, the
/// absence-of-value marker, and sequences/mappings composed recursively of
/// the same. Anything else (arbitrary object graphs, raw blobs) is rejected
/// at the type level rather than silently falling back to an opaque
/// encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value
    Nil,
    Bool(bool),
    /// Signed 64-bit integer
    Int(i64),
    /// Unsigned 64-bit integer
    UInt(u64),
    /// 64-bit float; round-trips exactly, including NaN bit patterns
    Float(f64),
    Str(String),
    /// Sequence of values
    List(Vec<Value>),
    /// String-keyed mapping; entry order is preserved
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Encode this value to its compact byte form
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Decode a value from an exact slice
    ///
    /// The slice must contain exactly one encoded value: truncated input,
    /// an unknown tag, or trailing bytes are all `Format` errors.
    pub fn decode(bytes: &[u8]) -> Result<Value> {
        let mut reader = Reader::new(bytes);
        let value = Self::decode_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(StoreError::Format(format!(
                "{} trailing bytes after value",
                reader.remaining()
            )));
        }
        Ok(value)
    }

    fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        match self {
            Value::Nil => buf.push(TAG_NIL),
            Value::Bool(false) => buf.push(TAG_FALSE),
            Value::Bool(true) => buf.push(TAG_TRUE),
            Value::Int(n) => {
                buf.push(TAG_INT);
                buf.extend_from_slice(&n.to_le_bytes());
            }
            Value::UInt(n) => {
                buf.push(TAG_UINT);
                buf.extend_from_slice(&n.to_le_bytes());
            }
            Value::Float(f) => {
                buf.push(TAG_FLOAT);
                buf.extend_from_slice(&f.to_bits().to_le_bytes());
            }
            Value::Str(s) => {
                buf.push(TAG_STR);
                buf.extend_from_slice(&encode_len(s.len())?);
                buf.extend_from_slice(s.as_bytes());
            }
            Value::List(items) => {
                buf.push(TAG_LIST);
                buf.extend_from_slice(&encode_len(items.len())?);
                for item in items {
                    item.encode_into(buf)?;
                }
            }
            Value::Map(entries) => {
                buf.push(TAG_MAP);
                buf.extend_from_slice(&encode_len(entries.len())?);
                for (key, value) in entries {
                    buf.extend_from_slice(&encode_len(key.len())?);
                    buf.extend_from_slice(key.as_bytes());
                    value.encode_into(buf)?;
                }
            }
        }
        Ok(())
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Value> {
        let tag = reader.read_u8()?;
        let value = match tag {
            TAG_NIL => Value::Nil,
            TAG_FALSE => Value::Bool(false),
            TAG_TRUE => Value::Bool(true),
            TAG_INT => Value::Int(i64::from_le_bytes(reader.read_array()?)),
            TAG_UINT => Value::UInt(u64::from_le_bytes(reader.read_array()?)),
            TAG_FLOAT => {
                Value::Float(f64::from_bits(u64::from_le_bytes(reader.read_array()?)))
            }
            TAG_STR => Value::Str(reader.read_string()?),
            TAG_LIST => {
                let count = reader.read_u32()? as usize;
                let mut items = Vec::with_capacity(count.min(reader.remaining()));
                for _ in 0..count {
                    items.push(Self::decode_from(reader)?);
                }
                Value::List(items)
            }
            TAG_MAP => {
                let count = reader.read_u32()? as usize;
                let mut entries = Vec::with_capacity(count.min(reader.remaining()));
                for _ in 0..count {
                    let key = reader.read_string()?;
                    let value = Self::decode_from(reader)?;
                    entries.push((key, value));
                }
                Value::Map(entries)
            }
            other => {
                return Err(StoreError::Format(format!(
                    "unknown value tag 0x{:02x}",
                    other
                )))
            }
        };
        Ok(value)
    }
}

/// Encode a length as the u32 prefix, rejecting oversized payloads
fn encode_len(len: usize) -> Result<[u8; 4]> {
    let len = u32::try_from(len).map_err(|_| {
        StoreError::ValueKind(format!("payload of {} elements exceeds u32 prefix", len))
    })?;
    Ok(len.to_le_bytes())
}

// =============================================================================
// Slice Reader
// =============================================================================

/// Bounds-checked cursor over an encoded value slice
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(StoreError::Format(format!(
                "truncated value: need {} bytes at offset {}, have {}",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        // read_bytes guarantees the length, so the conversion cannot fail
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| StoreError::Format(format!("invalid UTF-8 in string: {}", e)))
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Vec<(String, Value)>> for Value {
    fn from(v: Vec<(String, Value)>) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::List(iter.into_iter().map(Into::into).collect())
    }
}
