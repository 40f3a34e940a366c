//! On-Disk Layout
//!
//! Byte-level structure of a store file.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Header (48 bytes)                                        │
//! │   Magic: "MMAPKV01" (8)                                  │
//! │   High-water mark: 20 ASCII decimal digits, zero-padded  │
//! │   Index blob length: 20 ASCII decimal digits, zero-padded│
//! ├──────────────────────────────────────────────────────────┤
//! │ Data Region (variable)                                   │
//! │   Concatenated encoded record values, addressed by the   │
//! │   index. May contain dead bytes: logically deleted       │
//! │   records and index blobs superseded by later flushes.   │
//! ├──────────────────────────────────────────────────────────┤
//! │ Index Blob (variable, starts at the high-water mark)     │
//! │   bincode of Vec<(String, IndexEntry)> in insertion order│
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The header fields are ASCII decimal rather than raw binary integers so
//! the header is human-inspectable (`head -c 48 file`) and independent of
//! producer endianness. The digit budget is [`FIELD_WIDTH`] = 20 digits,
//! which holds every `u64`, so encoding cannot overflow; a field that does
//! not parse back as decimal is a `Format` error.

use crate::error::Result;
use crate::StoreError;

// =============================================================================
// Format Constants
// =============================================================================

/// Magic bytes identifying a mmapkv store file
pub const MAGIC: &[u8; 8] = b"MMAPKV01";

/// Width of each ASCII-decimal header field, in digits
pub const FIELD_WIDTH: usize = 20;

/// Header size: Magic (8) + High-water mark (20) + Index length (20) = 48
pub const HEADER_SIZE: u64 = (MAGIC.len() + 2 * FIELD_WIDTH) as u64;

// =============================================================================
// Header
// =============================================================================

/// The two mutable header fields
///
/// The high-water mark is the absolute file offset of the end of the data
/// region, which is also where the persisted index blob starts. Both fields
/// are rewritten together as the final, committing step of a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    /// End of the data region / start of the index blob
    pub high_water: u64,
    /// Byte length of the persisted index blob
    pub index_len: u64,
}

impl Header {
    /// Header for a freshly created, empty store
    pub fn empty(empty_index_len: u64) -> Self {
        Self {
            high_water: HEADER_SIZE,
            index_len: empty_index_len,
        }
    }

    /// Encode magic and both fields as the full fixed-width header
    pub fn encode(&self) -> [u8; HEADER_SIZE as usize] {
        let mut header = [0u8; HEADER_SIZE as usize];
        header[..MAGIC.len()].copy_from_slice(MAGIC);
        write_field(&mut header[MAGIC.len()..MAGIC.len() + FIELD_WIDTH], self.high_water);
        write_field(&mut header[MAGIC.len() + FIELD_WIDTH..], self.index_len);
        header
    }

    /// Decode and validate a header from the start of a mapped file
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE as usize {
            return Err(StoreError::Format(format!(
                "file too short for header: {} bytes, need {}",
                bytes.len(),
                HEADER_SIZE
            )));
        }
        if &bytes[..MAGIC.len()] != MAGIC {
            return Err(StoreError::Format(format!(
                "bad magic marker: expected {:?}, got {:?}",
                MAGIC,
                &bytes[..MAGIC.len()]
            )));
        }
        let high_water = parse_field(
            &bytes[MAGIC.len()..MAGIC.len() + FIELD_WIDTH],
            "high-water mark",
        )?;
        let index_len = parse_field(
            &bytes[MAGIC.len() + FIELD_WIDTH..HEADER_SIZE as usize],
            "index length",
        )?;
        if high_water < HEADER_SIZE {
            return Err(StoreError::Format(format!(
                "high-water mark {} inside the header",
                high_water
            )));
        }
        Ok(Self {
            high_water,
            index_len,
        })
    }
}

/// Render a field as zero-padded ASCII decimal into its fixed-width slot
fn write_field(slot: &mut [u8], value: u64) {
    // 20 digits hold u64::MAX, so the rendered text always fits the slot
    let text = format!("{:0width$}", value, width = FIELD_WIDTH);
    slot.copy_from_slice(text.as_bytes());
}

/// Parse a fixed-width ASCII-decimal field
fn parse_field(slot: &[u8], name: &str) -> Result<u64> {
    let text = std::str::from_utf8(slot)
        .map_err(|_| StoreError::Format(format!("{} field is not ASCII", name)))?;
    text.trim_start_matches('0').parse::<u64>().or_else(|_| {
        // an all-zeros field trims to the empty string
        if text.bytes().all(|b| b == b'0') {
            Ok(0)
        } else {
            Err(StoreError::Format(format!(
                "{} field is not decimal: {:?}",
                name, text
            )))
        }
    })
}
