//! Index Module
//!
//! In-memory mapping from key to the (offset, length) of its encoded value
//! in the data region, preserving insertion order.
//!
//! The index covers both persisted records and records whose bytes are
//! still buffered: a `put` records its final offset immediately, so nothing
//! moves at flush time. The persisted form is the bincode encoding of the
//! entries as an ordered `Vec<(String, IndexEntry)>`.

use std::collections::HashMap;

use rand::{rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::StoreError;

/// Location of one record's encoded value within the store file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Absolute file offset of the first value byte
    pub offset: u64,
    /// Encoded length in bytes
    pub length: u64,
}

/// Ordered key → entry mapping
///
/// Keeps a side list of keys so iteration follows insertion order; the
/// standard library has no ordered map, and the iteration-order contract
/// (persisted order first, then puts in call order) matters to callers that
/// stream records back out.
#[derive(Debug, Default)]
pub struct Index {
    entries: HashMap<String, IndexEntry>,
    order: Vec<String>,
}

impl Index {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key's entry
    pub fn lookup(&self, key: &str) -> Option<IndexEntry> {
        self.entries.get(key).copied()
    }

    /// Record a new key; the store is insert-only
    pub fn insert(&mut self, key: &str, offset: u64, length: u64) -> Result<()> {
        if self.entries.contains_key(key) {
            return Err(StoreError::DuplicateKey(key.to_string()));
        }
        self.entries
            .insert(key.to_string(), IndexEntry { offset, length });
        self.order.push(key.to_string());
        Ok(())
    }

    /// Logically delete a key; its bytes are never reclaimed
    pub fn remove(&mut self, key: &str) -> Result<IndexEntry> {
        match self.entries.remove(key) {
            Some(entry) => {
                self.order.retain(|k| k != key);
                Ok(entry)
            }
            None => Err(StoreError::KeyNotFound(key.to_string())),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All keys, in insertion order or as one fresh uniform permutation
    pub fn keys(&self, shuffle: bool) -> Vec<String> {
        let mut keys = self.order.clone();
        if shuffle {
            keys.shuffle(&mut rng());
        }
        keys
    }

    /// Iterate (key, entry) pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, IndexEntry)> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|e| (key.as_str(), *e)))
    }

    // =========================================================================
    // Persisted Form
    // =========================================================================

    /// Serialize the full index in insertion order
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let ordered: Vec<(&String, &IndexEntry)> = self
            .order
            .iter()
            .filter_map(|key| self.entries.get_key_value(key))
            .collect();
        bincode::serialize(&ordered)
            .map_err(|e| StoreError::Format(format!("index serialization failed: {}", e)))
    }

    /// Deserialize a persisted index blob
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let ordered: Vec<(String, IndexEntry)> = bincode::deserialize(bytes)
            .map_err(|e| StoreError::Format(format!("corrupt index blob: {}", e)))?;
        let mut index = Self::new();
        for (key, entry) in ordered {
            if index.entries.insert(key.clone(), entry).is_some() {
                return Err(StoreError::Format(format!(
                    "corrupt index blob: duplicate key {:?}",
                    key
                )));
            }
            index.order.push(key);
        }
        Ok(index)
    }
}
