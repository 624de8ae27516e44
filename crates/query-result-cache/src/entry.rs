//! Cached payload for one query result.

use crate::store::Weigher;
use arrow::record_batch::RecordBatch;
use cache_core::{chunk_allocated_bytes, Schema};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Entry stored in the cache.
///
/// Chunks are appended by exactly one writer while `write_in_progress` is
/// set; once the flag drops to false it never rises again for this entry,
/// and readers may materialize the chunks. The chunk vector has its own
/// lock only because Rust requires one to mutate through the shared
/// allocation; it is uncontended by construction.
pub struct CacheEntry {
    header: Schema,
    chunks: Mutex<Vec<RecordBatch>>,
    write_in_progress: AtomicBool,
    created_at: Instant,
}

impl CacheEntry {
    pub fn new(header: Schema) -> Self {
        Self {
            header,
            chunks: Mutex::new(Vec::new()),
            write_in_progress: AtomicBool::new(true),
            created_at: Instant::now(),
        }
    }

    pub fn header(&self) -> &Schema {
        &self.header
    }

    pub fn is_write_in_progress(&self) -> bool {
        self.write_in_progress.load(Ordering::Acquire)
    }

    /// One-way transition; publishes all chunk appends that happened before.
    pub fn mark_complete(&self) {
        self.write_in_progress.store(false, Ordering::Release);
    }

    pub fn push_chunk(&self, chunk: RecordBatch) {
        self.chunks.lock().push(chunk);
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.lock().len()
    }

    /// Cheap clone of the chunk run; batches share column buffers.
    pub fn chunks_snapshot(&self) -> Vec<RecordBatch> {
        self.chunks.lock().clone()
    }

    /// Sum of allocated bytes across chunks; the entry's weight.
    pub fn allocated_bytes(&self) -> usize {
        self.chunks.lock().iter().map(chunk_allocated_bytes).sum()
    }

    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

/// Weight function for entries: the sum of allocated bytes across chunks.
pub struct EntryWeigher;

impl Weigher<CacheEntry> for EntryWeigher {
    fn weight(&self, entry: &CacheEntry) -> usize {
        entry.allocated_bytes()
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("chunks", &self.num_chunks())
            .field("write_in_progress", &self.is_write_in_progress())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
    use cache_core::{DataType, Field};
    use std::sync::Arc;

    fn create_test_batch(values: Vec<i64>) -> RecordBatch {
        let schema = Arc::new(ArrowSchema::new(vec![ArrowField::new(
            "id",
            ArrowDataType::Int64,
            false,
        )]));
        let array = Arc::new(Int64Array::from(values));
        RecordBatch::try_new(schema, vec![array]).unwrap()
    }

    fn id_header() -> Schema {
        Schema::new(vec![Field::new("id", DataType::Int64, false)])
    }

    #[test]
    fn test_new_entry_is_write_in_progress() {
        let entry = CacheEntry::new(id_header());
        assert!(entry.is_write_in_progress());
        assert_eq!(entry.num_chunks(), 0);
        assert_eq!(entry.allocated_bytes(), 0);
    }

    #[test]
    fn test_mark_complete_is_one_way() {
        let entry = CacheEntry::new(id_header());
        entry.mark_complete();
        assert!(!entry.is_write_in_progress());
    }

    #[test]
    fn test_weight_tracks_chunks() {
        let entry = CacheEntry::new(id_header());
        entry.push_chunk(create_test_batch(vec![1, 2, 3]));
        let after_one = entry.allocated_bytes();
        assert!(after_one > 0);

        entry.push_chunk(create_test_batch(vec![4, 5, 6]));
        assert_eq!(entry.allocated_bytes(), after_one * 2);
        assert_eq!(entry.num_chunks(), 2);
    }
}
