//! # mmapkv
//!
//! A single-file, memory-mapped, append-only key-value store with:
//! - Fast startup: only the header and index blob are read, never the data
//! - Immediate readability of buffered writes via a pending overlay
//! - Crash-safe flushes (data, then index, then header — the header flip
//!   is the commit point)
//! - Insert-only semantics with logical deletes; space is never reclaimed
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Store                             │
//! │   open / get / put / remove / flush / close / iterate    │
//! └───────┬──────────────────┬──────────────────┬────────────┘
//!         │                  │                  │
//!         ▼                  ▼                  ▼
//!  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!  │    Index    │    │   Pending   │    │    Mmap     │
//!  │ key→(off,   │    │   Overlay   │    │ (data region│
//!  │    len)     │    │ (unflushed) │    │  + index)   │
//!  └──────┬──────┘    └─────────────┘    └─────────────┘
//!         │
//!         ▼
//!  ┌─────────────┐
//!  │    Value    │
//!  │ tagged byte │
//!  │    codec    │
//!  └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use mmapkv::{Store, Value};
//!
//! # fn main() -> mmapkv::Result<()> {
//! let mut store = Store::open_or_create("features.mmkv".as_ref(), false)?;
//! store.put("x", &Value::from_iter([1i64, 2, 3]))?;
//! store.put("y", &Value::from("hello"))?;
//! assert_eq!(store.get("y")?, Value::from("hello"));
//! store.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod value;
pub mod layout;
pub mod index;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StoreError};
pub use config::StoreConfig;
pub use index::IndexEntry;
pub use store::Store;
pub use value::Value;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of mmapkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
