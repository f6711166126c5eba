//! Helpers for building vector records and their metadata.

use crate::pipeline::TextChunk;
use crate::vector_index::types::{RecordMetadata, VectorRecord};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

/// Deterministic record identifier for a chunk of a document.
pub fn record_id(document_id: &str, chunk_index: usize) -> String {
    format!("{document_id}_{chunk_index}")
}

/// Pair chunks with their vectors, in order, and build the records to upsert.
///
/// The record id is derived from each chunk's `index`, never from its position in `vectors`.
pub fn build_records(
    document_id: &str,
    embedding_model: &str,
    chunks: Vec<TextChunk>,
    vectors: Vec<Vec<f32>>,
) -> Vec<VectorRecord> {
    debug_assert_eq!(chunks.len(), vectors.len());

    let now = current_timestamp_rfc3339();
    chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, values)| VectorRecord {
            id: record_id(document_id, chunk.index),
            values,
            metadata: RecordMetadata {
                chunk_hash: compute_chunk_hash(&chunk.text),
                text: chunk.text,
                document_id: document_id.to_string(),
                page_index: chunk.page_index,
                chunk_index: chunk.index,
                embedding_model: embedding_model.to_string(),
                indexed_at: now.clone(),
            },
        })
        .collect()
}

/// Compute a deterministic SHA-256 hash for the chunk text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Current timestamp formatted for payload storage.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
