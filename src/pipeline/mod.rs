//! Document ingestion pipeline.
//!
//! An [`IngestionRequest`] moves through `Received → Validated → Loaded → Chunked → Embedded →
//! Upserted → Completed`, or stops in `Failed { stage, reason }` at the first component error.
//! Every run returns an [`IngestionReport`]; errors never escape [`IngestionOrchestrator::run`].

pub mod chunking;
pub mod orchestrator;
pub mod request;
pub mod types;

pub use chunking::{ChunkingParams, split_pages};
pub use orchestrator::{IngestionApi, IngestionOrchestrator, PipelineSettings};
pub use request::IngestionRequest;
pub use types::{
    ChunkingError, IngestionReport, IngestionState, PipelineError, SetupError, Stage, StageError,
    TextChunk, ValidationError,
};
