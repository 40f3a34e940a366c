//! Error types for mmapkv
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for mmapkv operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // File Format Errors
    // -------------------------------------------------------------------------
    /// Bad magic marker, corrupt header fields, or an index blob that does
    /// not fit the file it claims to describe.
    #[error("Format error: {0}")]
    Format(String),

    /// Read-only open of a path that does not exist (or is empty).
    #[error("Store file not found: {0}")]
    NotFound(PathBuf),

    // -------------------------------------------------------------------------
    // Access Errors
    // -------------------------------------------------------------------------
    /// Write or flush attempted on a store opened read-only.
    #[error("Store is read-only")]
    ReadOnly,

    // -------------------------------------------------------------------------
    // Key Errors
    // -------------------------------------------------------------------------
    /// Insert of a key that already exists; the store is insert-only.
    #[error("Duplicate key: {0:?}")]
    DuplicateKey(String),

    #[error("Key not found: {0:?}")]
    KeyNotFound(String),

    // -------------------------------------------------------------------------
    // Value Errors
    // -------------------------------------------------------------------------
    /// Value shape outside the closed primitive set (e.g. a payload too
    /// large for its length prefix).
    #[error("Unsupported value: {0}")]
    ValueKind(String),
}
