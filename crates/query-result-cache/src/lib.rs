//! Query result cache for a columnar query engine.
//!
//! Memoizes the materialized result of a read query so subsequent
//! identical queries replay the stored chunks instead of re-executing the
//! pipeline.
//!
//! # Features
//!
//! - **Weight-aware LRU**: entries are bounded by total allocated bytes,
//!   with least-recently-used eviction
//! - **Writer/reader handles**: at most one writer per key; readers never
//!   observe a partially built entry
//! - **Timed removal**: a background worker evicts entries a configurable
//!   duration after they become readable
//! - **Per-query settings**: entry lifetime and size ceiling ride on the
//!   cache key's settings
//! - **Thread-safe**: shared freely across the engine's worker threads
//!
//! # Example
//!
//! ```ignore
//! use query_result_cache::{CacheConfig, CacheKey, QueryResultCache};
//!
//! let cache = QueryResultCache::new(CacheConfig::default());
//!
//! // Replay a cached result if one exists.
//! let mut reader = cache.try_read_from_cache(&key);
//! if let Some(source) = reader.take_source() {
//!     return Ok(pipeline_from(source));
//! }
//!
//! // Otherwise execute, feeding produced chunks to the writer.
//! let mut writer = cache.try_put_in_cache(&key);
//! for chunk in execute(&plan)? {
//!     writer.insert_chunk(chunk.clone());
//!     emit(chunk);
//! }
//! // Dropping the writer publishes the entry.
//! ```

pub mod cache;
pub mod config;
pub mod entry;
pub mod key;
pub mod reader;
pub mod scheduler;
pub mod stats;
pub mod store;
pub mod transform;
pub mod writer;

pub use cache::QueryResultCache;
pub use config::CacheConfig;
pub use entry::{CacheEntry, EntryWeigher};
pub use key::CacheKey;
pub use reader::CacheReader;
pub use scheduler::RemovalScheduler;
pub use stats::CacheStats;
pub use store::{WeightedStore, Weigher};
pub use transform::CachingSource;
pub use writer::CacheWriter;

/// Store specialization used by the cache: keys to entries, weighed by
/// allocated bytes.
pub type ResultStore = WeightedStore<CacheKey, CacheEntry, EntryWeigher>;
