//! Pipeline interposition.
//!
//! A [`CachingSource`] is spliced between a pipeline's source and its
//! consumers: every chunk flows downstream unchanged while a clone is fed
//! to the cache writer. Exhausting the source releases the writer and
//! publishes the entry; an upstream error cancels the write so partial
//! results never become readable.

use crate::writer::CacheWriter;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use cache_core::{ChunkSource, Result, Schema};

pub struct CachingSource<S: ChunkSource> {
    inner: S,
    writer: Option<CacheWriter>,
}

impl<S: ChunkSource> CachingSource<S> {
    pub fn new(inner: S, writer: CacheWriter) -> Self {
        Self {
            inner,
            writer: Some(writer),
        }
    }
}

#[async_trait]
impl<S: ChunkSource> ChunkSource for CachingSource<S> {
    async fn next_chunk(&mut self) -> Option<Result<RecordBatch>> {
        match self.inner.next_chunk().await {
            Some(Ok(chunk)) => {
                if let Some(writer) = self.writer.as_mut() {
                    writer.insert_chunk(chunk.clone());
                }
                Some(Ok(chunk))
            }
            Some(Err(err)) => {
                if let Some(mut writer) = self.writer.take() {
                    writer.cancel();
                }
                Some(Err(err))
            }
            None => {
                // Releasing the writer publishes the entry.
                self.writer.take();
                None
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        self.inner.is_exhausted()
    }

    fn header(&self) -> &Schema {
        self.inner.header()
    }
}
