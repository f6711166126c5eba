//! Batched writes to a vector sink with partial-progress reporting.

use crate::vector_index::client::VectorIndexService;
use crate::vector_index::types::{VectorIndexError, VectorRecord};
use async_trait::async_trait;
use std::ops::Range;
use thiserror::Error;

/// Destination that accepts batches of vector records.
#[async_trait]
pub trait VectorSink: Send + Sync {
    /// Upsert one batch, returning the number of records the sink acknowledged.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize, VectorIndexError>;
}

#[async_trait]
impl VectorSink for VectorIndexService {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize, VectorIndexError> {
        self.upsert_records(records).await
    }
}

/// Outcome of a fully successful batched upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of batches sent.
    pub batches: usize,
    /// Records acknowledged across all batches.
    pub upserted: usize,
}

/// A batch failed; earlier batches remain committed.
#[derive(Debug, Error)]
#[error(
    "batch {batch_index} (records {}..{}) of document {document_id} failed after {committed} records were committed: {source}",
    .records.start,
    .records.end
)]
pub struct SinkError {
    /// Document the records belong to.
    pub document_id: String,
    /// Zero-based index of the failing batch.
    pub batch_index: usize,
    /// Positions of the failing batch within the record list.
    pub records: Range<usize>,
    /// Records acknowledged before the failure.
    pub committed: usize,
    /// Batches that completed before the failure.
    pub committed_batches: usize,
    /// Underlying sink error.
    #[source]
    pub source: VectorIndexError,
}

/// Send `records` in order, at most `batch_size` per call, stopping at the first failure.
pub async fn upsert_in_batches(
    sink: &dyn VectorSink,
    document_id: &str,
    records: &[VectorRecord],
    batch_size: usize,
) -> Result<BatchSummary, SinkError> {
    let batch_size = batch_size.max(1);
    let mut summary = BatchSummary::default();

    for (batch_index, batch) in records.chunks(batch_size).enumerate() {
        let start = batch_index * batch_size;
        match sink.upsert(batch).await {
            Ok(upserted) => {
                summary.batches += 1;
                summary.upserted += upserted;
                tracing::debug!(
                    document_id,
                    batch_index,
                    records = batch.len(),
                    upserted,
                    "Batch upserted"
                );
            }
            Err(source) => {
                return Err(SinkError {
                    document_id: document_id.to_string(),
                    batch_index,
                    records: start..start + batch.len(),
                    committed: summary.upserted,
                    committed_batches: summary.batches,
                    source,
                });
            }
        }
    }

    Ok(summary)
}
