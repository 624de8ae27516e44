//! Query result cache facade.

use crate::config::CacheConfig;
use crate::entry::{CacheEntry, EntryWeigher};
use crate::key::CacheKey;
use crate::reader::CacheReader;
use crate::scheduler::RemovalScheduler;
use crate::stats::CacheStats;
use crate::store::WeightedStore;
use crate::writer::CacheWriter;
use crate::ResultStore;
use ahash::RandomState;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::warn;

/// Entry point for the engine: hands out writer and reader handles over a
/// shared weight-bounded store, and owns the background worker that
/// removes entries when their post-publication lifetime elapses.
pub struct QueryResultCache {
    store: Arc<ResultStore>,
    scheduler: Arc<RemovalScheduler>,
    worker: Option<JoinHandle<()>>,
    times_executed: Mutex<HashMap<CacheKey, u64, RandomState>>,
    stats: Arc<CacheStats>,
    live_writers: Arc<AtomicUsize>,
    config: CacheConfig,
}

impl QueryResultCache {
    /// Create a cache and start its removal worker.
    pub fn new(config: CacheConfig) -> Self {
        let store: Arc<ResultStore> = Arc::new(WeightedStore::new(
            config.max_total_bytes,
            config.max_entries,
            EntryWeigher,
        ));
        let scheduler = Arc::new(RemovalScheduler::new());

        let worker = {
            let store = Arc::clone(&store);
            let scheduler = Arc::clone(&scheduler);
            std::thread::spawn(move || scheduler.run(&store))
        };

        Self {
            store,
            scheduler,
            worker: Some(worker),
            times_executed: Mutex::new(HashMap::with_hasher(RandomState::new())),
            stats: Arc::new(CacheStats::new()),
            live_writers: Arc::new(AtomicUsize::new(0)),
            config,
        }
    }

    /// Create a cache with default configuration
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Obtain a writer for `key`.
    ///
    /// The returned handle holds insert rights only if no entry existed for
    /// the key; otherwise (or when the cache is disabled) it is passive and
    /// the query simply runs uncached.
    pub fn try_put_in_cache(&self, key: &CacheKey) -> CacheWriter {
        if !self.config.enabled {
            return self.writer_for(key, None);
        }

        let (entry, inserted) = self
            .store
            .get_or_set(key, || Arc::new(CacheEntry::new(key.header().clone())));

        if inserted {
            self.writer_for(key, Some(entry))
        } else {
            self.stats.record_rejected_write();
            self.writer_for(key, None)
        }
    }

    /// Obtain a reader for `key`; empty unless a complete entry exists.
    pub fn try_read_from_cache(&self, key: &CacheKey) -> CacheReader {
        if !self.config.enabled {
            return CacheReader::empty();
        }

        match self.store.get(key) {
            Some(entry) if !entry.is_write_in_progress() => {
                self.stats.record_hit();
                CacheReader::from_entry(&entry)
            }
            _ => {
                self.stats.record_miss();
                CacheReader::empty()
            }
        }
    }

    /// Advisory check; may race with eviction. Does not touch LRU order.
    pub fn contains_result(&self, key: &CacheKey) -> bool {
        self.config.enabled
            && self
                .store
                .peek(key)
                .map_or(false, |entry| !entry.is_write_in_progress())
    }

    /// Increment and return the execution count for `key`.
    ///
    /// Whether a count should gate caching is the engine's policy; the
    /// cache only keeps the tally.
    pub fn record_query_run(&self, key: &CacheKey) -> u64 {
        let mut counts = self.times_executed.lock();
        let count = counts.entry(key.clone()).or_insert(0);
        *count += 1;
        *count
    }

    /// Drop all cached entries.
    pub fn reset(&self) {
        self.store.reset();
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    /// Number of resident entries, complete or pending.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Bytes currently accounted against the weight budget.
    pub fn weight_used(&self) -> usize {
        self.store.weight()
    }

    /// Entries evicted by the weight or entry-count budgets.
    pub fn evictions(&self) -> u64 {
        self.store.evictions()
    }

    fn writer_for(&self, key: &CacheKey, entry: Option<Arc<CacheEntry>>) -> CacheWriter {
        let max_entry_bytes = match key.settings().max_entry_size() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => self.config.max_entry_bytes,
            Err(err) => {
                warn!(error = %err, "using configured entry size ceiling");
                self.config.max_entry_bytes
            }
        };
        let put_timeout = match key.settings().entry_put_timeout() {
            Ok(Some(timeout)) => timeout,
            Ok(None) => self.config.entry_put_timeout,
            Err(err) => {
                warn!(error = %err, "using configured entry lifetime");
                self.config.entry_put_timeout
            }
        };

        CacheWriter::new(
            key.clone(),
            entry,
            Arc::clone(&self.store),
            Arc::clone(&self.scheduler),
            Arc::clone(&self.stats),
            Arc::clone(&self.live_writers),
            max_entry_bytes,
            put_timeout,
        )
    }
}

impl Drop for QueryResultCache {
    fn drop(&mut self) {
        debug_assert_eq!(
            self.live_writers.load(Ordering::Relaxed),
            0,
            "all writers must be released before the cache is dropped"
        );
        self.scheduler.stop();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for QueryResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResultCache")
            .field("enabled", &self.config.enabled)
            .field("max_entries", &self.config.max_entries)
            .field("max_total_bytes", &self.config.max_total_bytes)
            .field("entries", &self.len())
            .field("weight_used", &self.weight_used())
            .finish()
    }
}
