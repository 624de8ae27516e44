//! Helpers over the engine's row-batch type.
//!
//! Chunks are Arrow [`RecordBatch`]es; the cache only ever needs their
//! allocated size and the ability to concatenate a run of them back into a
//! single batch.

use crate::error::Result;
use crate::schema::Schema;
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Bytes allocated by a chunk's column buffers.
pub fn chunk_allocated_bytes(chunk: &RecordBatch) -> usize {
    chunk
        .columns()
        .iter()
        .map(|col| col.get_array_memory_size())
        .sum()
}

/// Concatenate chunks along rows into one combined chunk.
///
/// An empty slice yields an empty batch with the given header's schema.
pub fn concat_chunks(header: &Schema, chunks: &[RecordBatch]) -> Result<RecordBatch> {
    let schema = match chunks.first() {
        Some(first) => first.schema(),
        None => Arc::new(header.to_arrow()),
    };
    Ok(concat_batches(&schema, chunks)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;
    use crate::Field;
    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};

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
    fn test_allocated_bytes_is_positive() {
        let batch = create_test_batch(vec![1, 2, 3]);
        assert!(chunk_allocated_bytes(&batch) > 0);
    }

    #[test]
    fn test_concat_preserves_row_order() {
        let header = id_header();
        let chunks = vec![
            create_test_batch(vec![1, 2, 3]),
            create_test_batch(vec![4, 5]),
        ];

        let combined = concat_chunks(&header, &chunks).unwrap();
        assert_eq!(combined.num_rows(), 5);

        let col = combined
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(col.values().to_vec(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_concat_empty_yields_empty_batch() {
        let header = id_header();
        let combined = concat_chunks(&header, &[]).unwrap();
        assert_eq!(combined.num_rows(), 0);
        assert_eq!(combined.num_columns(), 1);
    }
}
