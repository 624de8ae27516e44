//! Consumer-side cache handle.

use crate::entry::CacheEntry;
use cache_core::{concat_chunks, ReplaySource};
use tracing::warn;

/// Scoped handle over a complete cached result, or over nothing.
///
/// Construction eagerly concatenates the entry's chunks into one combined
/// chunk: downstream pipelines want a source they can pull from, and a
/// single allocation up front keeps that source trivial. The emitted rows
/// equal the original chunk run concatenated in order, under the same
/// header.
pub struct CacheReader {
    source: Option<ReplaySource>,
}

impl CacheReader {
    pub(crate) fn empty() -> Self {
        Self { source: None }
    }

    pub(crate) fn from_entry(entry: &CacheEntry) -> Self {
        let chunks = entry.chunks_snapshot();
        match concat_chunks(entry.header(), &chunks) {
            Ok(combined) => Self {
                source: Some(ReplaySource::new(entry.header().clone(), combined)),
            },
            Err(err) => {
                // Degrades to a miss; the query just re-executes.
                warn!(error = %err, "failed to materialize cached chunks");
                Self { source: None }
            }
        }
    }

    pub fn has_result(&self) -> bool {
        self.source.is_some()
    }

    /// Hand out the replay source; at most once.
    pub fn take_source(&mut self) -> Option<ReplaySource> {
        self.source.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
    use arrow::record_batch::RecordBatch;
    use cache_core::{ChunkSource, DataType, Field, Schema};
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
    fn test_empty_reader() {
        let mut reader = CacheReader::empty();
        assert!(!reader.has_result());
        assert!(reader.take_source().is_none());
    }

    #[tokio::test]
    async fn test_reader_concatenates_chunks() {
        let entry = CacheEntry::new(id_header());
        entry.push_chunk(create_test_batch(vec![1, 2]));
        entry.push_chunk(create_test_batch(vec![3, 4, 5]));
        entry.mark_complete();

        let mut reader = CacheReader::from_entry(&entry);
        assert!(reader.has_result());

        let mut source = reader.take_source().unwrap();
        let combined = source.next_chunk().await.unwrap().unwrap();
        assert_eq!(combined.num_rows(), 5);

        let col = combined
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(col.values().to_vec(), vec![1, 2, 3, 4, 5]);

        assert!(source.next_chunk().await.is_none());
    }

    #[test]
    fn test_take_source_is_single_shot() {
        let entry = CacheEntry::new(id_header());
        entry.push_chunk(create_test_batch(vec![1]));
        entry.mark_complete();

        let mut reader = CacheReader::from_entry(&entry);
        assert!(reader.take_source().is_some());
        assert!(reader.take_source().is_none());
        assert!(!reader.has_result());
    }

    #[test]
    fn test_empty_result_is_still_a_result() {
        let entry = CacheEntry::new(id_header());
        entry.mark_complete();

        let mut reader = CacheReader::from_entry(&entry);
        assert!(reader.has_result());
        assert_eq!(reader.take_source().unwrap().num_rows(), 0);
    }
}
