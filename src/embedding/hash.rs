use super::{EmbeddingClient, EmbeddingClientError, ensure_non_empty};
use async_trait::async_trait;

/// Deterministic offline embedding client that hashes bytes into vector slots.
///
/// Vectors carry no semantics beyond shared byte content; use it for smoke runs and tests.
pub struct HashEmbeddingClient {
    model: String,
    dimension: usize,
}

impl HashEmbeddingClient {
    /// Construct a client producing `dimension`-length vectors.
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            model: model.into(),
            dimension,
        }
    }

    fn encode(text: &str, dimension: usize) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; dimension];

        for (idx, byte) in text.bytes().enumerate() {
            let position = idx % dimension;
            embedding[position] += f32::from(byte) / 255.0;
        }

        let norm = embedding
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt();

        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingClient for HashEmbeddingClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if self.dimension == 0 {
            return Err(EmbeddingClientError::GenerationFailed(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        ensure_non_empty(&texts)?;

        Ok(texts
            .iter()
            .map(|text| Self::encode(text, self.dimension))
            .collect())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
