//! Core data types and error definitions for the ingestion pipeline.

use crate::{
    config::ConfigError, embedding::EmbeddingClientError, loader::LoadError,
    vector_index::{SinkError, VectorIndexError},
};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A bounded slice of page text; the unit of embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of the chunk in the document-wide sequence.
    pub index: usize,
    /// Chunk contents.
    pub text: String,
    /// Page the chunk was cut from.
    pub page_index: usize,
}

/// Errors produced while turning page text into chunks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    /// Ingestion configured an impossible chunk budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap would stop the window from advancing.
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge {
        /// Requested overlap.
        overlap: usize,
        /// Requested chunk size.
        chunk_size: usize,
    },
}

/// Reasons an ingestion request is rejected before any document work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The event carried no file path.
    #[error("request is missing a file path")]
    MissingFilePath,
    /// The event carried no document id.
    #[error("request is missing a document id")]
    MissingDocumentId,
    /// The path exists but is not a regular file.
    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),
    /// The path does not exist.
    #[error(transparent)]
    FileNotFound(LoadError),
    /// The path exists but could not be inspected.
    #[error("cannot access {}: {source}", .path.display())]
    Inaccessible {
        /// Requested path.
        path: PathBuf,
        /// Filesystem error from `stat`.
        #[source]
        source: std::io::Error,
    },
}

/// Errors emitted by the ingestion pipeline, one variant per component.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required configuration was missing.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
    /// Request failed validation.
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),
    /// Loader could not produce pages.
    #[error("Failed to load document: {0}")]
    Load(#[from] LoadError),
    /// Chunker rejected its parameters.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Embedding provider failed to produce vectors for the input text.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// A batch upsert failed.
    #[error("Failed to upsert records: {0}")]
    Sink(#[from] SinkError),
}

/// Errors raised while wiring the production pipeline together.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Embedding client could not be constructed.
    #[error("Failed to initialize embedding client: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Vector index client could not be constructed.
    #[error("Failed to initialize vector index client: {0}")]
    VectorIndex(#[from] VectorIndexError),
}

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Pre-flight configuration check.
    Configuration,
    /// Request field and file existence checks.
    Validation,
    /// Document loading.
    Loading,
    /// Chunking.
    Chunking,
    /// Embedding generation.
    Embedding,
    /// Batched upserts.
    Upserting,
}

impl Stage {
    /// Stable lowercase name used in logs and reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Validation => "validation",
            Self::Loading => "loading",
            Self::Chunking => "chunking",
            Self::Embedding => "embedding",
            Self::Upserting => "upserting",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pipeline error tagged with the stage that produced it.
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct StageError {
    /// Stage that failed.
    pub stage: Stage,
    /// Underlying error.
    #[source]
    pub error: PipelineError,
}

/// Attach a [`Stage`] to any component result.
pub(crate) trait AtStage<T> {
    fn at_stage(self, stage: Stage) -> Result<T, StageError>;
}

impl<T, E> AtStage<T> for Result<T, E>
where
    E: Into<PipelineError>,
{
    fn at_stage(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|error| StageError {
            stage,
            error: error.into(),
        })
    }
}

/// States of a single ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IngestionState {
    /// Request accepted, nothing checked yet.
    Received,
    /// Configuration and request checks passed.
    Validated,
    /// Pages extracted.
    Loaded,
    /// Chunks produced.
    Chunked,
    /// Every chunk has a vector.
    Embedded,
    /// Every batch was accepted by the index.
    Upserted,
    /// Terminal success.
    Completed,
    /// Terminal failure.
    Failed {
        /// Stage that failed.
        stage: Stage,
        /// Human-readable cause.
        reason: String,
    },
}

impl IngestionState {
    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    /// Document the run was for.
    pub document_id: String,
    /// Final state.
    pub state: IngestionState,
    /// Every state visited, in order, including the final one.
    pub transitions: Vec<IngestionState>,
    /// Pages extracted by the loader.
    pub pages: usize,
    /// Chunks produced by the chunker.
    pub chunks: usize,
    /// Records the index acknowledged, including batches committed before a failure.
    pub records_upserted: usize,
    /// Upsert requests that succeeded.
    pub batches: usize,
}

impl IngestionReport {
    pub(crate) fn received(document_id: &str) -> Self {
        Self {
            document_id: document_id.to_string(),
            state: IngestionState::Received,
            transitions: vec![IngestionState::Received],
            pages: 0,
            chunks: 0,
            records_upserted: 0,
            batches: 0,
        }
    }

    pub(crate) fn advance(&mut self, state: IngestionState) {
        debug_assert!(!self.state.is_terminal());
        tracing::debug!(document_id = %self.document_id, from = ?self.state, to = ?state, "Ingestion transition");
        self.transitions.push(state.clone());
        self.state = state;
    }

    /// Whether the run reached `Completed`.
    pub fn is_completed(&self) -> bool {
        self.state == IngestionState::Completed
    }

    /// Stage of the failure, if the run failed.
    pub fn failed_stage(&self) -> Option<Stage> {
        match &self.state {
            IngestionState::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
