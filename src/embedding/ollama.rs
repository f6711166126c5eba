use super::{EmbeddingClient, EmbeddingClientError, ensure_non_empty, unexpected_status};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Embedding client for a local Ollama runtime (`POST /api/embed`).
pub struct OllamaEmbeddingClient {
    http: Client,
    endpoint: String,
    model: String,
}

impl OllamaEmbeddingClient {
    /// Build a client for the runtime at `base_url`.
    pub fn new(base_url: &str, model: String) -> Result<Self, EmbeddingClientError> {
        let http = Client::builder().user_agent("pdf-indexer/embed").build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/api/embed", base_url.trim_end_matches('/')),
            model,
        })
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingClient for OllamaEmbeddingClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        ensure_non_empty(&texts)?;

        let response = self
            .http
            .post(&self.endpoint)
            .json(&EmbedRequest {
                model: &self.model,
                input: &texts,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let error = unexpected_status(response).await;
            tracing::error!(model = %self.model, error = %error, "Ollama embedding request failed");
            return Err(error);
        }

        let EmbedResponse { embeddings } = response.json().await?;
        if embeddings.len() != texts.len() {
            return Err(EmbeddingClientError::CountMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }
        tracing::trace!(model = %self.model, inputs = texts.len(), "Ollama embeddings received");
        Ok(embeddings)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
