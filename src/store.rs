//! Store Module
//!
//! The public façade: a single-file, memory-mapped, append-only key/value
//! store.
//!
//! ## Responsibilities
//! - Open or create the store file and own its memory mapping
//! - Serve reads from the mapping or the pending-write overlay
//! - Buffer writes and run the flush/checkpoint protocol
//!
//! ## Durability Model
//!
//! A `put` is readable immediately but durable only after a flush. A flush
//! appends the buffered bytes *after* the committed index blob, writes the
//! new index blob after them, and only then rewrites the header fields.
//! The header flip is the commit point: a crash anywhere before it leaves
//! the old header pointing at the old, untouched index blob, so a reader
//! reopening the file sees either the fully-old or the fully-new state,
//! never a mix. The superseded index blob is stranded as dead bytes inside
//! the data region; the format never reclaims space.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::Result;
use crate::index::Index;
use crate::layout::{Header, HEADER_SIZE};
use crate::value::Value;
use crate::StoreError;

/// A single-file, memory-mapped, append-only key/value store
///
/// ## Ownership Model
///
/// The mapping is exclusively owned by this instance and is replaced during
/// `flush`. No mapped-memory reference ever escapes: every read decodes
/// into an owned [`Value`], so callers cannot hold a view that a remap
/// would invalidate.
///
/// Single-process by design: one owning process holds the mutable handle.
/// Concurrent read-only opens of the same file are safe only while no
/// writer is flushing; there is no cross-process locking.
pub struct Store {
    /// Path of the store file (flush reopens it by path)
    path: PathBuf,
    /// Read mapping of the whole file
    map: Mmap,
    /// Key → (offset, length), persisted entries plus provisional entries
    /// for buffered records (offsets are final at `put` time)
    index: Index,
    /// Encoded-but-unflushed values, readable immediately
    pending: HashMap<String, Vec<u8>>,
    /// Bytes to append at the next flush, in `put` order
    write_buf: Vec<u8>,
    /// Committed header: end of the data region
    high_water: u64,
    /// Committed header: length of the persisted index blob
    index_len: u64,
    /// Index differs from the persisted blob (puts or removals)
    dirty: bool,
    read_only: bool,
    config: StoreConfig,
}

impl Store {
    // =========================================================================
    // Open / Create
    // =========================================================================

    /// Open an existing store, or create an empty one if the path is
    /// missing (or an empty file)
    ///
    /// With `read_only` set, a missing path is a `NotFound` error and every
    /// write or flush on the returned store fails `ReadOnly`.
    pub fn open_or_create(path: &Path, read_only: bool) -> Result<Self> {
        Self::open_with_config(path, read_only, StoreConfig::default())
    }

    /// Open or create with explicit tuning knobs
    pub fn open_with_config(path: &Path, read_only: bool, config: StoreConfig) -> Result<Self> {
        let file_len = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        if file_len == 0 {
            if read_only {
                return Err(StoreError::NotFound(path.to_path_buf()));
            }
            Self::create(path, config)
        } else {
            Self::open_existing(path, read_only, config, file_len)
        }
    }

    /// Create a fresh store file: header plus an empty index blob
    fn create(path: &Path, config: StoreConfig) -> Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;

        let index = Index::new();
        let index_bytes = index.to_bytes()?;
        let header = Header::empty(index_bytes.len() as u64);

        file.write_all(&header.encode())?;
        file.write_all(&index_bytes)?;
        file.sync_all()?;

        let map = unsafe { Mmap::map(&file)? };

        debug!(path = %path.display(), "created empty store");

        Ok(Self {
            path: path.to_path_buf(),
            map,
            index,
            pending: HashMap::new(),
            write_buf: Vec::new(),
            high_water: header.high_water,
            index_len: header.index_len,
            dirty: false,
            read_only: false,
            config,
        })
    }

    /// Open and validate an existing store file
    ///
    /// Startup cost is header + index blob only; the data region is mapped,
    /// never scanned.
    fn open_existing(
        path: &Path,
        read_only: bool,
        config: StoreConfig,
        file_len: u64,
    ) -> Result<Self> {
        let file = if read_only {
            File::open(path)?
        } else {
            OpenOptions::new().read(true).write(true).open(path)?
        };
        let map = unsafe { Mmap::map(&file)? };

        let header = Header::decode(&map)?;
        let index_end = header.high_water.checked_add(header.index_len).ok_or_else(|| {
            StoreError::Format("index blob extent overflows u64".to_string())
        })?;
        if index_end > file_len {
            return Err(StoreError::Format(format!(
                "index blob [{}, {}) extends past end of file ({} bytes)",
                header.high_water, index_end, file_len
            )));
        }

        let index = Index::from_bytes(&map[header.high_water as usize..index_end as usize])?;

        // Every persisted entry must point inside the data region.
        for (key, entry) in index.iter() {
            match entry.offset.checked_add(entry.length) {
                Some(end) if entry.offset >= HEADER_SIZE && end <= header.high_water => {}
                _ => {
                    return Err(StoreError::Format(format!(
                        "entry for {:?} at [{}, +{}) outside data region (high-water mark {})",
                        key, entry.offset, entry.length, header.high_water
                    )));
                }
            }
        }

        debug!(
            path = %path.display(),
            size = file_len,
            entries = index.len(),
            read_only,
            "opened store"
        );

        Ok(Self {
            path: path.to_path_buf(),
            map,
            index,
            pending: HashMap::new(),
            write_buf: Vec::new(),
            high_water: header.high_water,
            index_len: header.index_len,
            dirty: false,
            read_only,
            config,
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a value by key
    ///
    /// Buffered records are served from the pending overlay; persisted
    /// records are decoded from the mapping. Always returns an owned value.
    pub fn get(&self, key: &str) -> Result<Value> {
        if let Some(bytes) = self.pending.get(key) {
            return Value::decode(bytes);
        }
        let entry = self
            .index
            .lookup(key)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))?;
        let start = entry.offset as usize;
        let end = start + entry.length as usize;
        if end > self.map.len() {
            return Err(StoreError::Format(format!(
                "entry for {:?} at [{}, {}) outside mapped file ({} bytes)",
                key,
                start,
                end,
                self.map.len()
            )));
        }
        Value::decode(&self.map[start..end])
    }

    /// Check whether a key exists in either layer
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains(key)
    }

    /// Number of records (persisted plus buffered)
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All keys
    ///
    /// `shuffle` draws one fresh uniform permutation per call; otherwise
    /// keys come back in insertion order (persisted order first, then
    /// buffered puts in call order).
    pub fn keys(&self, shuffle: bool) -> Vec<String> {
        self.index.keys(shuffle)
    }

    /// All records, decoded, in the same order contract as [`Store::keys`]
    pub fn entries(&self, shuffle: bool) -> Result<Vec<(String, Value)>> {
        let keys = self.index.keys(shuffle);
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.get(&key)?;
            entries.push((key, value));
        }
        Ok(entries)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert a record; the store is insert-only, so an existing key (in
    /// either layer) fails `DuplicateKey` and leaves the old value intact
    ///
    /// The record is readable immediately via [`Store::get`] but durable
    /// only after the next flush. Exceeding the configured buffer threshold
    /// triggers one automatically.
    pub fn put(&mut self, key: &str, value: &Value) -> Result<()> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        let bytes = value.encode()?;
        // The offset is final now: flushed data lands right after the
        // committed index blob, in buffer order.
        let offset = self.high_water + self.index_len + self.write_buf.len() as u64;
        self.index.insert(key, offset, bytes.len() as u64)?;
        self.write_buf.extend_from_slice(&bytes);
        self.pending.insert(key.to_string(), bytes);
        self.dirty = true;

        if self.write_buf.len() >= self.config.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Logically delete a key from whichever layer holds it
    ///
    /// The key disappears from lookups and iteration; its bytes stay in the
    /// data region forever (no compaction). Fails `KeyNotFound` on a miss.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        self.index.remove(key)?;
        self.pending.remove(key);
        self.dirty = true;
        Ok(())
    }

    /// Persist buffered writes and index changes
    ///
    /// No-op when nothing changed since the last flush. Write order is
    /// data, then index blob, then header; see the module docs for why
    /// this sequence is crash-safe. On failure the file keeps its
    /// last-known-good state and the buffer is retained, so the caller may
    /// retry the flush or abandon the instance.
    pub fn flush(&mut self) -> Result<()> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        if !self.dirty {
            return Ok(());
        }

        // Fresh read/write handle; the mapping in `self.map` stays on the
        // old handle until the swap below.
        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;

        // (1) Data: appended after the committed index blob, which must
        //     survive intact in case this flush never commits.
        let data_start = self.high_water + self.index_len;
        let new_high_water = data_start + self.write_buf.len() as u64;
        file.seek(SeekFrom::Start(data_start))?;
        file.write_all(&self.write_buf)?;

        // (2) Index blob, immediately after the new data.
        let index_bytes = self.index.to_bytes()?;
        file.write_all(&index_bytes)?;
        file.sync_data()?;

        // (3) Header flip: the commit point.
        let header = Header {
            high_water: new_high_water,
            index_len: index_bytes.len() as u64,
        };
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&header.encode())?;
        file.sync_all()?;

        // Remap from the fresh handle and swap; the old mapping drops
        // here. Reads return owned values, so no caller holds a slice
        // into the stale map.
        self.map = unsafe { Mmap::map(&file)? };

        debug!(
            path = %self.path.display(),
            flushed = self.write_buf.len(),
            entries = self.index.len(),
            high_water = new_high_water,
            "flushed store"
        );

        self.high_water = new_high_water;
        self.index_len = index_bytes.len() as u64;
        self.write_buf.clear();
        self.pending.clear();
        self.dirty = false;
        Ok(())
    }

    /// Close the store, flushing first when mutable
    pub fn close(mut self) -> Result<()> {
        if !self.read_only {
            self.flush()?;
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Path of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this instance rejects writes
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    /// Committed end of the data region (advances only on flush)
    pub fn high_water_mark(&self) -> u64 {
        self.high_water
    }

    /// Bytes currently buffered and awaiting flush
    pub fn buffered_bytes(&self) -> usize {
        self.write_buf.len()
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        // Best-effort flush of unflushed writes, mirroring close().
        if !self.read_only && self.dirty {
            if let Err(e) = self.flush() {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to flush store on drop; buffered writes lost"
                );
            }
        }
    }
}
