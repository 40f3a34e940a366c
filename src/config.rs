//! Configuration for a mmapkv store
//!
//! Centralized configuration with sensible defaults.

/// Tuning knobs for a `Store` instance
#[derive(Debug, Clone)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Write Buffering
    // -------------------------------------------------------------------------
    /// Max bytes of buffered (unflushed) writes before an automatic flush.
    ///
    /// This is a performance knob, not a correctness requirement: buffered
    /// records are readable immediately either way, they are just not
    /// durable until the next flush.
    pub flush_threshold: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            flush_threshold: 64 * 1024, // 64 KiB
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the auto-flush threshold (in bytes of buffered writes)
    pub fn flush_threshold(mut self, bytes: usize) -> Self {
        self.config.flush_threshold = bytes;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
