//! Ingestion orchestrator driving one document through load, chunk, embed and upsert.

use crate::{
    config::{Config, VectorIndexConfig},
    embedding::{EmbeddingClient, EmbeddingClientError, get_embedding_client},
    loader::{DocumentLoader, PdfLoader, missing_file_error},
    metrics::{IngestMetrics, MetricsSnapshot},
    pipeline::{
        chunking::{ChunkingParams, split_pages},
        request::IngestionRequest,
        types::{
            AtStage, IngestionReport, IngestionState, SetupError, Stage, StageError, TextChunk,
            ValidationError,
        },
    },
    vector_index::{VectorIndexService, VectorSink, build_records, upsert_in_batches},
};
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt, stream};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

/// Tunables that shape a single run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Index configuration checked before any work starts.
    pub index: VectorIndexConfig,
    /// Chunk window parameters.
    pub chunking: ChunkingParams,
    /// Records per upsert request.
    pub upsert_batch_size: usize,
    /// Chunk texts per embedding request.
    pub embedding_batch_size: usize,
    /// Embedding requests in flight at once.
    pub embedding_concurrency: usize,
    /// Required vector length; when `None` the first vector of the run sets it.
    pub embedding_dimension: Option<usize>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            index: VectorIndexConfig::default(),
            chunking: ChunkingParams::default(),
            upsert_batch_size: 50,
            embedding_batch_size: 16,
            embedding_concurrency: 4,
            embedding_dimension: None,
        }
    }
}

impl PipelineSettings {
    /// Derive settings from the process configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            index: config.vector_index.clone(),
            chunking: ChunkingParams {
                chunk_size: config.text_splitter_chunk_size,
                chunk_overlap: config.text_splitter_chunk_overlap,
            },
            upsert_batch_size: config.upsert_batch_size,
            embedding_batch_size: config.embedding_batch_size,
            embedding_concurrency: config.embedding_concurrency,
            embedding_dimension: Some(config.embedding_dimension),
        }
    }
}

/// Abstraction over the pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait IngestionApi: Send + Sync {
    /// Run one request to a terminal state.
    async fn ingest(&self, request: IngestionRequest) -> IngestionReport;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Coordinates the ingestion pipeline for one request at a time.
///
/// Components are trait objects built once at process start and shared across requests; the
/// orchestrator itself holds no per-request state, so concurrent `run` calls are independent.
pub struct IngestionOrchestrator {
    loader: Arc<dyn DocumentLoader>,
    embedder: Arc<dyn EmbeddingClient>,
    sink: Arc<dyn VectorSink>,
    settings: PipelineSettings,
    metrics: Arc<IngestMetrics>,
}

impl IngestionOrchestrator {
    /// Assemble an orchestrator from explicit components.
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        embedder: Arc<dyn EmbeddingClient>,
        sink: Arc<dyn VectorSink>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            loader,
            embedder,
            sink,
            settings,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Build the production pipeline: PDF loader, configured embedder, HTTP vector index.
    pub fn from_config(config: &Config) -> Result<Self, SetupError> {
        tracing::info!("Initializing embedding client");
        let embedder = get_embedding_client(config)?;
        let sink = Arc::new(VectorIndexService::new(&config.vector_index)?);
        tracing::info!(
            model = embedder.model(),
            index = config.vector_index.name.as_deref().unwrap_or("<unset>"),
            "Ingestion pipeline ready"
        );
        Ok(Self::new(
            Arc::new(PdfLoader::new()),
            embedder,
            sink,
            PipelineSettings::from_config(config),
        ))
    }

    /// Current counter values.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Normalize a raw upload event and ingest it.
    pub async fn run_event(&self, event: &Value) -> IngestionReport {
        self.run(IngestionRequest::from_event(event)).await
    }

    /// Ingest one document. Never fails: the outcome is carried by the report's final state.
    pub async fn run(&self, request: IngestionRequest) -> IngestionReport {
        let mut report = IngestionReport::received(&request.document_id);
        tracing::info!(
            document_id = %request.document_id,
            file_path = %request.file_path,
            "Ingestion started"
        );

        match self.execute(&request, &mut report).await {
            Ok(()) => {
                report.advance(IngestionState::Completed);
                self.metrics
                    .record_document(report.records_upserted as u64, report.batches as u64);
                tracing::info!(
                    document_id = %report.document_id,
                    pages = report.pages,
                    chunks = report.chunks,
                    records = report.records_upserted,
                    batches = report.batches,
                    "Document indexed"
                );
            }
            Err(StageError { stage, error }) => {
                let reason = error.to_string();
                tracing::error!(
                    stage = %stage,
                    document_id = %report.document_id,
                    error = %reason,
                    committed = report.records_upserted,
                    "Ingestion failed"
                );
                report.advance(IngestionState::Failed { stage, reason });
                self.metrics
                    .record_failure(report.records_upserted as u64, report.batches as u64);
            }
        }
        report
    }

    async fn execute(
        &self,
        request: &IngestionRequest,
        report: &mut IngestionReport,
    ) -> Result<(), StageError> {
        self.settings
            .index
            .require()
            .at_stage(Stage::Configuration)?;

        let path = validate(request).await.at_stage(Stage::Validation)?;
        report.advance(IngestionState::Validated);

        let pages = self.loader.load(&path).await.at_stage(Stage::Loading)?;
        report.pages = pages.len();
        report.advance(IngestionState::Loaded);

        let chunks = split_pages(&pages, self.settings.chunking).at_stage(Stage::Chunking)?;
        report.chunks = chunks.len();
        report.advance(IngestionState::Chunked);

        let chunks: Vec<TextChunk> = chunks
            .into_iter()
            .filter(|chunk| {
                let keep = !chunk.text.trim().is_empty();
                if !keep {
                    tracing::warn!(
                        document_id = %request.document_id,
                        chunk_index = chunk.index,
                        "Skipping blank chunk"
                    );
                }
                keep
            })
            .collect();
        if chunks.is_empty() {
            tracing::warn!(
                document_id = %request.document_id,
                pages = report.pages,
                "Document produced no text; nothing to index"
            );
        }

        let vectors = self.embed(&chunks).await.at_stage(Stage::Embedding)?;
        report.advance(IngestionState::Embedded);

        let records = build_records(&request.document_id, self.embedder.model(), chunks, vectors);
        let summary = upsert_in_batches(
            self.sink.as_ref(),
            &request.document_id,
            &records,
            self.settings.upsert_batch_size,
        )
        .await
        .inspect_err(|error| {
            report.records_upserted = error.committed;
            report.batches = error.committed_batches;
        })
        .at_stage(Stage::Upserting)?;
        report.records_upserted = summary.upserted;
        report.batches = summary.batches;
        report.advance(IngestionState::Upserted);

        Ok(())
    }

    /// Embed chunk texts in sub-batches with bounded concurrency, preserving input order.
    async fn embed(&self, chunks: &[TextChunk]) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let batch_size = self.settings.embedding_batch_size.max(1);
        let concurrency = self.settings.embedding_concurrency.max(1);
        let embedder = &self.embedder;

        let text_batches: Vec<Vec<String>> = chunks
            .chunks(batch_size)
            .map(|batch| batch.iter().map(|chunk| chunk.text.clone()).collect())
            .collect();

        let requests = text_batches.into_iter().map(|texts| async move {
            let expected = texts.len();
            let vectors = embedder.generate_embeddings(texts).await?;
            if vectors.len() != expected {
                return Err(EmbeddingClientError::CountMismatch {
                    expected,
                    actual: vectors.len(),
                });
            }
            Ok::<_, EmbeddingClientError>(vectors)
        });

        let batches: Vec<Vec<Vec<f32>>> = stream::iter(requests)
            .buffered(concurrency)
            .try_collect()
            .await?;

        let vectors: Vec<Vec<f32>> = batches.into_iter().flatten().collect();
        if vectors.len() != chunks.len() {
            return Err(EmbeddingClientError::CountMismatch {
                expected: chunks.len(),
                actual: vectors.len(),
            });
        }

        let expected = self
            .settings
            .embedding_dimension
            .or_else(|| vectors.first().map(Vec::len));
        if let Some(expected) = expected
            && let Some(vector) = vectors.iter().find(|vector| vector.len() != expected)
        {
            return Err(EmbeddingClientError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        Ok(vectors)
    }
}

#[async_trait]
impl IngestionApi for IngestionOrchestrator {
    async fn ingest(&self, request: IngestionRequest) -> IngestionReport {
        self.run(request).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        IngestionOrchestrator::metrics_snapshot(self)
    }
}

async fn validate(request: &IngestionRequest) -> Result<PathBuf, ValidationError> {
    let file_path = request.file_path.trim();
    if file_path.is_empty() {
        return Err(ValidationError::MissingFilePath);
    }
    if request.document_id.trim().is_empty() {
        return Err(ValidationError::MissingDocumentId);
    }

    let path = PathBuf::from(file_path);
    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => Ok(path),
        Ok(_) => Err(ValidationError::NotAFile(path)),
        Err(error) if error.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Input file does not exist");
            Err(ValidationError::FileNotFound(
                missing_file_error(&path).await,
            ))
        }
        Err(source) => Err(ValidationError::Inaccessible { path, source }),
    }
}
