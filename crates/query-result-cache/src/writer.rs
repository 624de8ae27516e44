//! Producer-side cache handle.

use crate::entry::CacheEntry;
use crate::key::CacheKey;
use crate::scheduler::RemovalScheduler;
use crate::stats::CacheStats;
use crate::ResultStore;
use arrow::record_batch::RecordBatch;
use cache_core::chunk_allocated_bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Scoped handle that accumulates a query's output chunks.
///
/// Exactly one writer per key holds insert rights: the one whose factory
/// ran inside the store's `get_or_set`. All others (contention losers,
/// disabled cache) are passive and drop every chunk. Dropping an owning
/// writer publishes the entry for readers and schedules its removal.
/// `cancel` is the failure path: the engine must call it when execution
/// errors so a partial result is never published.
pub struct CacheWriter {
    key: CacheKey,
    /// `Some` while this handle holds insert rights for the pending entry.
    entry: Option<Arc<CacheEntry>>,
    store: Arc<ResultStore>,
    scheduler: Arc<RemovalScheduler>,
    stats: Arc<CacheStats>,
    live_writers: Arc<AtomicUsize>,
    written_bytes: usize,
    max_entry_bytes: usize,
    put_timeout: Duration,
}

impl CacheWriter {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        key: CacheKey,
        entry: Option<Arc<CacheEntry>>,
        store: Arc<ResultStore>,
        scheduler: Arc<RemovalScheduler>,
        stats: Arc<CacheStats>,
        live_writers: Arc<AtomicUsize>,
        max_entry_bytes: usize,
        put_timeout: Duration,
    ) -> Self {
        if entry.is_some() {
            live_writers.fetch_add(1, Ordering::Relaxed);
        }
        Self {
            key,
            entry,
            store,
            scheduler,
            stats,
            live_writers,
            written_bytes: 0,
            max_entry_bytes,
            put_timeout,
        }
    }

    /// Whether this handle may still insert chunks.
    pub fn can_insert(&self) -> bool {
        self.entry.is_some()
    }

    /// Append a chunk to the pending entry.
    ///
    /// Chunks are silently dropped once insert rights are gone. An insert
    /// pushing the entry past the per-entry ceiling evicts the whole entry
    /// and ends the write; inserts filling it exactly are fine.
    pub fn insert_chunk(&mut self, chunk: RecordBatch) {
        let Some(entry) = self.entry.as_ref() else {
            return;
        };

        let bytes = chunk_allocated_bytes(&chunk);
        if self.written_bytes + bytes > self.max_entry_bytes {
            debug!(
                key = self.key.fingerprint(),
                written_bytes = self.written_bytes,
                chunk_bytes = bytes,
                ceiling = self.max_entry_bytes,
                "entry exceeded size ceiling, evicting"
            );
            self.store.remove(&self.key);
            self.relinquish();
            return;
        }

        self.written_bytes += bytes;
        entry.push_chunk(chunk);

        if !self.store.refresh(&self.key, entry) {
            // Evicted under pressure while still being written; the result
            // will not be cached.
            debug!(
                key = self.key.fingerprint(),
                "pending entry evicted mid-write"
            );
            self.relinquish();
        }
    }

    /// Abort the write: the entry is made unpublishable and removed.
    pub fn cancel(&mut self) {
        if self.relinquish().is_some() {
            debug!(key = self.key.fingerprint(), "cache write cancelled");
            self.store.remove(&self.key);
        }
    }

    fn relinquish(&mut self) -> Option<Arc<CacheEntry>> {
        let entry = self.entry.take();
        if entry.is_some() {
            self.live_writers.fetch_sub(1, Ordering::Relaxed);
        }
        entry
    }
}

impl Drop for CacheWriter {
    fn drop(&mut self) {
        if let Some(entry) = self.relinquish() {
            // Publish before scheduling so the removal can never target an
            // entry readers could not yet have seen.
            entry.mark_complete();
            self.stats.record_scheduled_removal();
            self.scheduler
                .schedule_removal(self.put_timeout, self.key.clone());
            debug!(
                key = self.key.fingerprint(),
                chunks = entry.num_chunks(),
                bytes = self.written_bytes,
                "published cache entry"
            );
        }
    }
}
