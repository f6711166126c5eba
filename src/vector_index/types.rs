//! Shared types used by the vector index client and helpers.

use crate::config::ConfigError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while interacting with the vector index.
#[derive(Debug, Error)]
pub enum VectorIndexError {
    /// Index name or credential is missing.
    #[error("Vector index is not configured: {0}")]
    Config(#[from] ConfigError),
    /// Host URL failed to parse or normalize.
    #[error("Invalid vector index URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Index responded with an unexpected status code.
    #[error("Unexpected vector index response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the index.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// A record's vector does not match the index dimension.
    #[error("Record {id} has dimension {actual}, index expects {expected}")]
    DimensionMismatch {
        /// Offending record.
        id: String,
        /// Dimension reported by the index.
        expected: usize,
        /// Dimension of the record's vector.
        actual: usize,
    },
}

/// Unit of storage: one embedded chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorRecord {
    /// `{document_id}_{chunk_index}`; stable across re-ingestion.
    pub id: String,
    /// Embedding vector.
    pub values: Vec<f32>,
    /// Payload stored next to the vector.
    pub metadata: RecordMetadata,
}

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordMetadata {
    /// Chunk text.
    pub text: String,
    /// Owning document, serialized as `file_id`.
    #[serde(rename = "file_id")]
    pub document_id: String,
    /// Source page, zero-based.
    #[serde(rename = "page")]
    pub page_index: usize,
    /// Position of the chunk within the document.
    pub chunk_index: usize,
    /// SHA-256 of the chunk text.
    pub chunk_hash: String,
    /// Model that produced the vector.
    pub embedding_model: String,
    /// RFC 3339 time the record was built.
    pub indexed_at: String,
}

/// Index properties reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexDescription {
    /// Index name.
    pub name: String,
    /// Data-plane host, usually without a scheme.
    pub host: String,
    /// Vector dimension, when reported.
    #[serde(default)]
    pub dimension: Option<usize>,
}

#[derive(Serialize)]
pub(crate) struct UpsertRequest<'a> {
    pub(crate) vectors: &'a [VectorRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) namespace: Option<&'a str>,
}

#[derive(Deserialize)]
pub(crate) struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    pub(crate) upserted_count: Option<usize>,
}
