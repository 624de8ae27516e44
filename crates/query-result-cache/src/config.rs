//! Cache configuration options

use std::time::Duration;

/// Configuration for the query result cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache
    pub max_entries: usize,
    /// Total weight budget across all entries, in bytes
    pub max_total_bytes: usize,
    /// Default per-entry size ceiling, in bytes
    pub max_entry_bytes: usize,
    /// Default duration an entry stays readable after the writer releases it
    pub entry_put_timeout: Duration,
    /// Whether caching is enabled
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            max_total_bytes: 128 * 1024 * 1024, // 128 MB
            max_entry_bytes: 16 * 1024 * 1024,  // 16 MB
            entry_put_timeout: Duration::from_secs(60),
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Create a disabled cache configuration
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Set the maximum number of entries
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set the total weight budget
    pub fn with_max_total_bytes(mut self, max_total_bytes: usize) -> Self {
        self.max_total_bytes = max_total_bytes;
        self
    }

    /// Set the default per-entry ceiling
    pub fn with_max_entry_bytes(mut self, max_entry_bytes: usize) -> Self {
        self.max_entry_bytes = max_entry_bytes;
        self
    }

    /// Set the default entry lifetime after publication
    pub fn with_entry_put_timeout(mut self, timeout: Duration) -> Self {
        self.entry_put_timeout = timeout;
        self
    }

    /// Enable or disable the cache
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
