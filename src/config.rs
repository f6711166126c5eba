use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_CONTROL_URL: &str = "https://api.pinecone.io";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
const DEFAULT_EMBEDDING_DIMENSION: usize = 384;
const DEFAULT_CHUNK_SIZE: usize = 500;
const DEFAULT_CHUNK_OVERLAP: usize = 50;
const DEFAULT_UPSERT_BATCH_SIZE: usize = 50;
const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 16;
const DEFAULT_EMBEDDING_CONCURRENCY: usize = 4;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the indexer.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Target vector index and its credentials.
    pub vector_index: VectorIndexConfig,
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Number of chunk texts sent per embedding request.
    pub embedding_batch_size: usize,
    /// Maximum number of embedding requests in flight for one document.
    pub embedding_concurrency: usize,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
    /// API key for the OpenAI embeddings API.
    pub openai_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible embeddings API.
    pub openai_base_url: String,
    /// Maximum characters per chunk.
    pub text_splitter_chunk_size: usize,
    /// Characters shared between consecutive chunks of a page.
    pub text_splitter_chunk_overlap: usize,
    /// Records per upsert request.
    pub upsert_batch_size: usize,
    /// Optional override for the HTTP listener port.
    pub server_port: Option<u16>,
}

/// Connection settings for the external vector index.
///
/// The name and API key are required for every ingestion run, but their absence is reported by
/// the orchestrator's pre-flight step rather than at process start so that the failure is
/// attributed to the run that needed them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VectorIndexConfig {
    /// Credential sent as the `Api-Key` header.
    pub api_key: Option<String>,
    /// Index identifier.
    pub name: Option<String>,
    /// Data-plane host; resolved through the control plane when absent.
    pub host: Option<String>,
    /// Optional namespace inside the index.
    pub namespace: Option<String>,
    /// Control-plane base URL used to describe the index.
    pub control_url: String,
}

/// Index credentials after the pre-flight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIndex {
    /// Index identifier.
    pub name: String,
    /// Credential sent as the `Api-Key` header.
    pub api_key: String,
}

impl VectorIndexConfig {
    /// Ensure both the index name and the credential are present.
    pub fn require(&self) -> Result<ResolvedIndex, ConfigError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingVariable("VECTOR_INDEX_API_KEY".into()))?;
        let name = self
            .name
            .clone()
            .ok_or_else(|| ConfigError::MissingVariable("VECTOR_INDEX_NAME".into()))?;
        Ok(ResolvedIndex { name, api_key })
    }
}

/// Supported embedding backends for the processing pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Hosted OpenAI embeddings API.
    OpenAI,
    /// Offline deterministic hashing embedder.
    Hash,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let embedding_provider = match optional("EMBEDDING_PROVIDER") {
            Some(value) => value
                .parse()
                .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".into()))?,
            None => EmbeddingProvider::Ollama,
        };

        let config = Self {
            vector_index: VectorIndexConfig {
                api_key: optional("VECTOR_INDEX_API_KEY"),
                name: optional("VECTOR_INDEX_NAME"),
                host: optional("VECTOR_INDEX_HOST"),
                namespace: optional("VECTOR_INDEX_NAMESPACE"),
                control_url: optional("VECTOR_INDEX_CONTROL_URL")
                    .unwrap_or_else(|| DEFAULT_CONTROL_URL.to_string()),
            },
            embedding_provider,
            embedding_model: optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimension: parse_or(
                optional("EMBEDDING_DIMENSION"),
                "EMBEDDING_DIMENSION",
                DEFAULT_EMBEDDING_DIMENSION,
            )?,
            embedding_batch_size: parse_or(
                optional("EMBEDDING_BATCH_SIZE"),
                "EMBEDDING_BATCH_SIZE",
                DEFAULT_EMBEDDING_BATCH_SIZE,
            )?,
            embedding_concurrency: parse_or(
                optional("EMBEDDING_CONCURRENCY"),
                "EMBEDDING_CONCURRENCY",
                DEFAULT_EMBEDDING_CONCURRENCY,
            )?,
            ollama_url: optional("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            openai_api_key: optional("OPENAI_API_KEY"),
            openai_base_url: optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            text_splitter_chunk_size: parse_or(
                optional("TEXT_SPLITTER_CHUNK_SIZE"),
                "TEXT_SPLITTER_CHUNK_SIZE",
                DEFAULT_CHUNK_SIZE,
            )?,
            text_splitter_chunk_overlap: parse_or(
                optional("TEXT_SPLITTER_CHUNK_OVERLAP"),
                "TEXT_SPLITTER_CHUNK_OVERLAP",
                DEFAULT_CHUNK_OVERLAP,
            )?,
            upsert_batch_size: parse_or(
                optional("UPSERT_BATCH_SIZE"),
                "UPSERT_BATCH_SIZE",
                DEFAULT_UPSERT_BATCH_SIZE,
            )?,
            server_port: optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("EMBEDDING_DIMENSION", self.embedding_dimension),
            ("EMBEDDING_BATCH_SIZE", self.embedding_batch_size),
            ("EMBEDDING_CONCURRENCY", self.embedding_concurrency),
            ("TEXT_SPLITTER_CHUNK_SIZE", self.text_splitter_chunk_size),
            ("UPSERT_BATCH_SIZE", self.upsert_batch_size),
        ];
        if let Some((key, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::InvalidValue((*key).to_string()));
        }
        if self.text_splitter_chunk_overlap >= self.text_splitter_chunk_size {
            return Err(ConfigError::InvalidValue(
                "TEXT_SPLITTER_CHUNK_OVERLAP".into(),
            ));
        }
        if self.embedding_provider == EmbeddingProvider::OpenAI && self.openai_api_key.is_none() {
            return Err(ConfigError::MissingVariable("OPENAI_API_KEY".into()));
        }
        Ok(())
    }
}

fn parse_or(value: Option<String>, key: &str, default: usize) -> Result<usize, ConfigError> {
    value
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
        .map(|parsed| parsed.unwrap_or(default))
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "hash" => Ok(Self::Hash),
            _ => Err(()),
        }
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        index = ?config.vector_index.name,
        host = ?config.vector_index.host,
        has_api_key = config.vector_index.api_key.is_some(),
        embedding_provider = ?config.embedding_provider,
        embedding_model = %config.embedding_model,
        chunk_size = config.text_splitter_chunk_size,
        chunk_overlap = config.text_splitter_chunk_overlap,
        batch_size = config.upsert_batch_size,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
