//! HTTP client wrapper for a Pinecone-compatible vector index.

use crate::config::VectorIndexConfig;
use crate::vector_index::types::{
    IndexDescription, UpsertRequest, UpsertResponse, VectorIndexError, VectorRecord,
};
use reqwest::{Client, Method};
use tokio::sync::OnceCell;

const API_VERSION: &str = "2024-07";

/// Data-plane location of the index and its vector dimension, when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndexTarget {
    pub(crate) host: String,
    pub(crate) dimension: Option<usize>,
}

/// Lightweight HTTP client for vector index operations.
pub struct VectorIndexService {
    pub(crate) client: Client,
    pub(crate) control_url: String,
    pub(crate) config: VectorIndexConfig,
    pub(crate) target: OnceCell<IndexTarget>,
}

impl VectorIndexService {
    /// Construct a client from the index configuration.
    ///
    /// Credentials are checked on every call rather than here, so a process can start without
    /// them and report the problem per request. The data-plane host is resolved lazily on first
    /// upsert unless it is configured explicitly.
    pub fn new(config: &VectorIndexConfig) -> Result<Self, VectorIndexError> {
        let client = Client::builder().user_agent("pdf-indexer/0.1").build()?;
        let control_url =
            normalize_base_url(&config.control_url).map_err(VectorIndexError::InvalidUrl)?;

        let preset = match config.host.as_deref() {
            Some(host) => Some(IndexTarget {
                host: normalize_host(host)?,
                dimension: None,
            }),
            None => None,
        };

        tracing::debug!(
            index = config.name.as_deref().unwrap_or("<unset>"),
            control_url = %control_url,
            host = preset.as_ref().map(|target| target.host.as_str()).unwrap_or("<resolve>"),
            namespace = config.namespace.as_deref().unwrap_or(""),
            has_api_key = config.api_key.is_some(),
            "Initialized vector index HTTP client"
        );

        Ok(Self {
            client,
            control_url,
            config: config.clone(),
            target: OnceCell::new_with(preset),
        })
    }

    /// Ask the control plane for the index host and dimension.
    pub async fn describe_index(&self) -> Result<IndexDescription, VectorIndexError> {
        let index = self.config.require()?;
        let url = format_endpoint(&self.control_url, &format!("indexes/{}", index.name));
        let response = self
            .request(Method::GET, url, &index.api_key)
            .send()
            .await?;
        let response = ensure_success(response, "describe index").await?;
        let description: IndexDescription = response.json().await?;
        tracing::debug!(
            index = %description.name,
            host = %description.host,
            dimension = ?description.dimension,
            "Described vector index"
        );
        Ok(description)
    }

    /// Upsert a single batch of records, returning the count acknowledged by the index.
    pub async fn upsert_records(&self, records: &[VectorRecord]) -> Result<usize, VectorIndexError> {
        let index = self.config.require()?;
        if records.is_empty() {
            return Ok(0);
        }

        let target = self.resolve_target().await?;
        if let Some(expected) = target.dimension
            && let Some(record) = records.iter().find(|record| record.values.len() != expected)
        {
            return Err(VectorIndexError::DimensionMismatch {
                id: record.id.clone(),
                expected,
                actual: record.values.len(),
            });
        }

        let url = format_endpoint(&target.host, "vectors/upsert");
        let response = self
            .request(Method::POST, url, &index.api_key)
            .json(&UpsertRequest {
                vectors: records,
                namespace: self.config.namespace.as_deref(),
            })
            .send()
            .await?;
        let response = ensure_success(response, "upsert").await?;

        let body = response.text().await.unwrap_or_default();
        let upserted = match serde_json::from_str::<UpsertResponse>(&body) {
            Ok(UpsertResponse {
                upserted_count: Some(count),
            }) => count,
            Ok(_) => records.len(),
            Err(err) => {
                tracing::warn!(
                    index = %index.name,
                    error = %err,
                    "Upsert response was not understood; assuming the whole batch was written"
                );
                records.len()
            }
        };
        if upserted != records.len() {
            tracing::warn!(
                index = %index.name,
                records = records.len(),
                upserted,
                "Index acknowledged a different number of records than were sent"
            );
        }

        tracing::debug!(
            index = %index.name,
            records = records.len(),
            upserted,
            "Records upserted"
        );
        Ok(upserted)
    }

    pub(crate) async fn resolve_target(&self) -> Result<&IndexTarget, VectorIndexError> {
        self.target
            .get_or_try_init(|| async {
                let description = self.describe_index().await?;
                Ok(IndexTarget {
                    host: normalize_host(&description.host)?,
                    dimension: description.dimension,
                })
            })
            .await
    }

    fn request(&self, method: Method, url: String, api_key: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Api-Key", api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }
}

async fn ensure_success(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, VectorIndexError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let error = VectorIndexError::UnexpectedStatus { status, body };
    tracing::error!(operation, error = %error, "Vector index request failed");
    Err(error)
}

/// Hosts reported by the control plane omit the scheme.
fn normalize_host(host: &str) -> Result<String, VectorIndexError> {
    let host = host.trim();
    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    normalize_base_url(&with_scheme).map_err(VectorIndexError::InvalidUrl)
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_index::types::RecordMetadata;
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };
    use serde_json::json;

    fn service(control_url: String, target: Option<IndexTarget>) -> VectorIndexService {
        VectorIndexService {
            client: Client::builder()
                .user_agent("pdf-indexer-test")
                .build()
                .expect("client"),
            control_url: control_url.clone(),
            config: VectorIndexConfig {
                api_key: Some("secret".into()),
                name: Some("resumes".into()),
                control_url,
                ..Default::default()
            },
            target: OnceCell::new_with(target),
        }
    }

    fn record(id: &str, values: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.into(),
            values,
            metadata: RecordMetadata {
                text: "chunk".into(),
                document_id: "doc".into(),
                page_index: 0,
                chunk_index: 0,
                chunk_hash: "abc".into(),
                embedding_model: "m".into(),
                indexed_at: "2024-01-01T00:00:00Z".into(),
            },
        }
    }

    #[tokio::test]
    async fn upsert_posts_records_to_configured_host() {
        let server = MockServer::start_async().await;
        let records = vec![record("doc_0", vec![0.5, 0.25]), record("doc_1", vec![1.0, 0.0])];
        let expected_body = json!({ "vectors": serde_json::to_value(&records).unwrap() });

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/vectors/upsert")
                    .json_body(expected_body.clone());
                then.status(200).json_body(json!({ "upsertedCount": 2 }));
            })
            .await;

        let service = service(
            "http://control.invalid".into(),
            Some(IndexTarget {
                host: server.base_url(),
                dimension: None,
            }),
        );
        let upserted = service.upsert_records(&records).await.expect("upsert");

        mock.assert_async().await;
        assert_eq!(upserted, 2);
    }

    #[tokio::test]
    async fn upsert_reports_acknowledged_count() {
        let server = MockServer::start_async().await;
        let short = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/vectors/upsert")
                    .body_contains("\"id\":\"doc_0\"");
                then.status(200).json_body(json!({ "upsertedCount": 1 }));
            })
            .await;
        let garbled = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/vectors/upsert")
                    .body_contains("\"id\":\"doc_5\"");
                then.status(200).body("not json");
            })
            .await;

        let service = service(
            "http://control.invalid".into(),
            Some(IndexTarget {
                host: server.base_url(),
                dimension: None,
            }),
        );
        let acknowledged = service
            .upsert_records(&[record("doc_0", vec![0.1]), record("doc_1", vec![0.2])])
            .await
            .expect("short upsert");
        let assumed = service
            .upsert_records(&[record("doc_5", vec![0.1]), record("doc_6", vec![0.2])])
            .await
            .expect("garbled upsert");

        short.assert_async().await;
        garbled.assert_async().await;
        assert_eq!(acknowledged, 1);
        assert_eq!(assumed, 2);
    }

    #[tokio::test]
    async fn host_is_resolved_once_through_control_plane() {
        let server = MockServer::start_async().await;
        let data_plane = server.base_url();
        let describe = server
            .mock_async(|when, then| {
                when.method(GET).path("/indexes/resumes");
                then.status(200).json_body(json!({
                    "name": "resumes",
                    "host": data_plane,
                    "dimension": 2
                }));
            })
            .await;
        let upsert = server
            .mock_async(|when, then| {
                when.method(POST).path("/vectors/upsert");
                then.status(200).json_body(json!({}));
            })
            .await;

        let service = service(server.base_url(), None);
        let first = service
            .upsert_records(&[record("doc_0", vec![0.1, 0.2])])
            .await
            .expect("first upsert");
        let second = service
            .upsert_records(&[record("doc_1", vec![0.3, 0.4]), record("doc_2", vec![0.5, 0.6])])
            .await
            .expect("second upsert");

        describe.assert_hits_async(1).await;
        upsert.assert_hits_async(2).await;
        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected_before_sending() {
        let server = MockServer::start_async().await;
        let upsert = server
            .mock_async(|when, then| {
                when.method(POST).path("/vectors/upsert");
                then.status(200);
            })
            .await;

        let service = service(
            "http://control.invalid".into(),
            Some(IndexTarget {
                host: server.base_url(),
                dimension: Some(3),
            }),
        );
        let error = service
            .upsert_records(&[record("doc_0", vec![0.1, 0.2, 0.3]), record("doc_1", vec![0.1])])
            .await
            .unwrap_err();

        upsert.assert_hits_async(0).await;
        assert!(matches!(
            error,
            VectorIndexError::DimensionMismatch { ref id, expected: 3, actual: 1 } if id == "doc_1"
        ));
    }

    #[tokio::test]
    async fn rejected_upsert_surfaces_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/vectors/upsert");
                then.status(401).body("invalid api key");
            })
            .await;

        let service = service(
            "http://control.invalid".into(),
            Some(IndexTarget {
                host: server.base_url(),
                dimension: None,
            }),
        );
        let error = service
            .upsert_records(&[record("doc_0", vec![0.1])])
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            VectorIndexError::UnexpectedStatus { status, ref body }
                if status.as_u16() == 401 && body == "invalid api key"
        ));
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let service = service("http://control.invalid".into(), None);
        assert_eq!(service.upsert_records(&[]).await.expect("no-op"), 0);
    }

    #[tokio::test]
    async fn upsert_without_credentials_is_a_configuration_error() {
        let config = VectorIndexConfig {
            name: Some("resumes".into()),
            control_url: "https://api.pinecone.io".into(),
            ..Default::default()
        };
        let service = VectorIndexService::new(&config).expect("client builds without key");
        let error = service
            .upsert_records(&[record("doc_0", vec![0.1])])
            .await
            .unwrap_err();
        assert!(matches!(error, VectorIndexError::Config(_)));
        assert!(error.to_string().contains("VECTOR_INDEX_API_KEY"));
    }

    #[test]
    fn bare_hosts_get_https_scheme() {
        assert_eq!(
            normalize_host("resumes-abc.svc.pinecone.io").unwrap(),
            "https://resumes-abc.svc.pinecone.io/"
        );
        assert_eq!(
            normalize_host("http://localhost:5080/").unwrap(),
            "http://localhost:5080/"
        );
        assert_eq!(
            format_endpoint("https://resumes-abc.svc.pinecone.io/", "vectors/upsert"),
            "https://resumes-abc.svc.pinecone.io/vectors/upsert"
        );
    }
}
