#![deny(missing_docs)]

//! Core library for the PDF indexer: loader, chunker, embedder and vector sink, driven by an
//! ingestion orchestrator.

/// HTTP routing for upload events and diagnostics.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Document loading.
pub mod loader;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Ingestion pipeline and state machine.
pub mod pipeline;
/// Vector index integration.
pub mod vector_index;
