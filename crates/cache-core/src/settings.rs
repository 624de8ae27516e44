//! Per-query settings visible to the cache.
//!
//! Entries are kept name-sorted so that equality and hashing are
//! deterministic regardless of insertion order.

use crate::error::{CacheError, Result};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Duration an entry lives after becoming readable, in milliseconds.
pub const ENTRY_PUT_TIMEOUT: &str = "query_cache_entry_put_timeout";
/// Per-entry size ceiling in bytes.
pub const MAX_ENTRY_SIZE: &str = "max_query_cache_entry_size";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    entries: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|v| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name-sorted iteration; the order is part of the hashing contract.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn hash_into<H: Hasher>(&self, state: &mut H) {
        for (name, value) in self.iter() {
            name.hash(state);
            value.hash(state);
        }
    }

    /// `query_cache_entry_put_timeout`, if present.
    pub fn entry_put_timeout(&self) -> Result<Option<Duration>> {
        self.parse_u64(ENTRY_PUT_TIMEOUT)
            .map(|opt| opt.map(Duration::from_millis))
    }

    /// `max_query_cache_entry_size`, if present.
    pub fn max_entry_size(&self) -> Result<Option<usize>> {
        self.parse_u64(MAX_ENTRY_SIZE)
            .map(|opt| opt.map(|v| v as usize))
    }

    fn parse_u64(&self, name: &str) -> Result<Option<u64>> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<u64>()
                .map(Some)
                .map_err(|_| CacheError::InvalidSetting {
                    name: name.to_string(),
                    value: raw.to_string(),
                }),
        }
    }
}
