//! HTTP surface for the indexer.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /events` – Accept a `file.uploaded` event, start ingestion in the background and answer
//!   `202 Accepted` with the normalized document id. The outcome is reported through logs and
//!   `/metrics`, not the response.
//! - `GET /metrics` – Observe ingestion counters.
//! - `GET /health` – Liveness probe.

use crate::pipeline::{IngestionApi, IngestionRequest};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Build the HTTP router exposing the ingestion API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: IngestionApi + 'static,
{
    Router::new()
        .route("/events", post(accept_event::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/health", get(health))
        .with_state(service)
}

/// Response body for `POST /events`.
#[derive(Serialize)]
struct EventAccepted {
    status: &'static str,
    document_id: String,
}

/// Normalize the event and hand it to a background task.
async fn accept_event<S>(
    State(service): State<Arc<S>>,
    Json(event): Json<Value>,
) -> (StatusCode, Json<EventAccepted>)
where
    S: IngestionApi + 'static,
{
    let request = IngestionRequest::from_event(&event);
    let document_id = request.document_id.clone();
    tracing::info!(
        document_id = %request.document_id,
        file_path = %request.file_path,
        "Upload event accepted"
    );

    tokio::spawn(async move {
        service.ingest(request).await;
    });

    (
        StatusCode::ACCEPTED,
        Json(EventAccepted {
            status: "accepted",
            document_id,
        }),
    )
}

/// Return the ingestion counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: IngestionApi,
{
    Json(service.metrics_snapshot())
}

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::metrics::MetricsSnapshot;
    use crate::pipeline::{IngestionApi, IngestionReport, IngestionRequest, IngestionState};
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{Mutex, Notify};
    use tower::ServiceExt;

    #[derive(Default)]
    struct StubIngestion {
        calls: Mutex<Vec<IngestionRequest>>,
        ingested: Notify,
    }

    #[async_trait]
    impl IngestionApi for StubIngestion {
        async fn ingest(&self, request: IngestionRequest) -> IngestionReport {
            let document_id = request.document_id.clone();
            self.calls.lock().await.push(request);
            self.ingested.notify_one();
            IngestionReport {
                document_id,
                state: IngestionState::Completed,
                transitions: vec![IngestionState::Received, IngestionState::Completed],
                pages: 1,
                chunks: 1,
                records_upserted: 1,
                batches: 1,
            }
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_indexed: 3,
                documents_failed: 1,
                chunks_indexed: 42,
                batches_upserted: 5,
            }
        }
    }

    #[tokio::test]
    async fn events_route_accepts_and_dispatches_in_background() {
        let service = Arc::new(StubIngestion::default());
        let app = create_router(service.clone());

        let payload = json!({
            "type": "file.uploaded",
            "data": { "filePath": "/uploads/cv.pdf", "fileId": "cv-9" }
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/events")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["status"], "accepted");
        assert_eq!(json["document_id"], "cv-9");

        tokio::time::timeout(Duration::from_secs(2), service.ingested.notified())
            .await
            .expect("ingestion dispatched");
        let calls = service.calls.lock().await;
        assert_eq!(
            calls.as_slice(),
            &[IngestionRequest::new("/uploads/cv.pdf", "cv-9")]
        );
    }

    #[tokio::test]
    async fn events_route_rejects_non_json_bodies() {
        let service = Arc::new(StubIngestion::default());
        let app = create_router(service.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/events")
                    .header("content-type", "application/json")
                    .body(Body::from("not json"))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert!(response.status().is_client_error());
        assert!(service.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn metrics_route_returns_snapshot() {
        let app = create_router(Arc::new(StubIngestion::default()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["documents_indexed"], 3);
        assert_eq!(json["documents_failed"], 1);
        assert_eq!(json["chunks_indexed"], 42);
        assert_eq!(json["batches_upserted"], 5);
    }

    #[tokio::test]
    async fn health_route_reports_ok() {
        let app = create_router(Arc::new(StubIngestion::default()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        assert_eq!(&body[..], b"ok");
    }
}
