//! Vector index integration: record construction, the HTTP client, and batched upserts.

pub mod client;
pub mod payload;
pub mod sink;
pub mod types;

pub use client::VectorIndexService;
pub use payload::{build_records, compute_chunk_hash, record_id};
pub use sink::{BatchSummary, SinkError, VectorSink, upsert_in_batches};
pub use types::{IndexDescription, RecordMetadata, VectorIndexError, VectorRecord};
