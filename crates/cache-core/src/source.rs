//! Pipeline source abstraction.
//!
//! Downstream operators pull chunks from a [`ChunkSource`]; the cache
//! produces a [`ReplaySource`] that emits a previously materialized result
//! as a single chunk.

use crate::error::Result;
use crate::schema::Schema;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;

/// Trait for chunk-producing pipeline sources
#[async_trait]
pub trait ChunkSource: Send {
    /// Get the next chunk from the source.
    /// Returns None when the source is exhausted.
    async fn next_chunk(&mut self) -> Option<Result<RecordBatch>>;

    /// Check if the source has more data
    fn is_exhausted(&self) -> bool;

    /// Schema of the chunks this source emits
    fn header(&self) -> &Schema;
}

/// Single-shot source replaying one combined chunk.
pub struct ReplaySource {
    header: Schema,
    chunk: Option<RecordBatch>,
}

impl ReplaySource {
    pub fn new(header: Schema, chunk: RecordBatch) -> Self {
        Self {
            header,
            chunk: Some(chunk),
        }
    }

    /// Total rows this source will emit.
    pub fn num_rows(&self) -> usize {
        self.chunk.as_ref().map_or(0, |c| c.num_rows())
    }
}

#[async_trait]
impl ChunkSource for ReplaySource {
    async fn next_chunk(&mut self) -> Option<Result<RecordBatch>> {
        self.chunk.take().map(Ok)
    }

    fn is_exhausted(&self) -> bool {
        self.chunk.is_none()
    }

    fn header(&self) -> &Schema {
        &self.header
    }
}
