//! HTTP ingress
//!
//! An Axum server exposing the sample ingest endpoint. Callers authenticate
//! with a shared secret in the `x-api-key` header; scoring runs on the request
//! task and the store append runs on the blocking pool.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{IngestConfig, API_KEY_HEADER};
use crate::error::IngestError;
use crate::pipeline::{enrich_sample, Ingested, SleepProcessor};
use crate::schema::Validator;
use crate::store::StoreError;
use crate::IMSONIACK_VERSION;

/// Path of the ingest endpoint
pub const INGEST_PATH: &str = "/storeIoTData";

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct IngestState {
    processor: Arc<SleepProcessor>,
    api_key: Arc<String>,
}

impl IngestState {
    pub fn new(processor: SleepProcessor, api_key: impl Into<String>) -> Self {
        Self {
            processor: Arc::new(processor),
            api_key: Arc::new(api_key.into()),
        }
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), IngestError> {
        let provided = headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        match provided {
            Some(key) if key == self.api_key.as_str() => Ok(()),
            _ => {
                log::warn!(
                    "Unauthorized access attempt (key header {})",
                    if provided.is_some() { "mismatched" } else { "missing" }
                );
                Err(IngestError::Unauthorized)
            }
        }
    }
}

/// Successful ingest response
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    pub result: String,
    #[serde(rename = "docId")]
    pub doc_id: String,
}

/// Health endpoint response payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = match &self {
            IngestError::Unauthorized => StatusCode::UNAUTHORIZED,
            IngestError::InvalidInput(_) | IngestError::InvalidTimestamp(_) => {
                StatusCode::BAD_REQUEST
            }
            // Malformed request JSON is InvalidInput; this variant is our own encoding
            IngestError::StorageFailure(_) | IngestError::Config(_) | IngestError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            // Storage details stay in the server log
            IngestError::StorageFailure(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };

        (
            status,
            Json(serde_json::json!({ "error": message, "code": self.code() })),
        )
            .into_response()
    }
}

/// Build the Axum router with all handlers.
pub fn build_router(state: IngestState) -> Router {
    Router::new()
        .route(INGEST_PATH, post(store_sample))
        .route("/health", get(health))
        .with_state(state)
}

async fn store_sample(
    State(state): State<IngestState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SaveResponse>, IngestError> {
    state.authorize(&headers)?;

    let sample = Validator::validate_bytes(&body)?;
    let record = enrich_sample(&sample, chrono::Utc::now())?;

    let processor = state.processor.clone();
    let Ingested { id, .. } = tokio::task::spawn_blocking(move || processor.persist(record))
        .await
        .map_err(|e| IngestError::StorageFailure(StoreError::Task(e.to_string())))??;

    Ok(Json(SaveResponse {
        result: "Data saved successfully".to_string(),
        doc_id: id.to_string(),
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: IMSONIACK_VERSION.to_string(),
    })
}

/// Errors that stop the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server stopped: {0}")]
    Serve(std::io::Error),
}

/// Run the HTTP server loop until Ctrl-C.
pub async fn serve(config: IngestConfig) -> Result<(), ServerError> {
    config.validate()?;
    let store = config.open_store()?;
    let state = IngestState::new(SleepProcessor::new(store), config.api_key.clone());

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind,
            source,
        })?;

    log::info!(
        "Ingest server listening on {} (key prefix {}***)",
        config.bind,
        config.api_key_preview()
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    log::info!("Ingest server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::SleepStage;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const KEY: &str = "test-secret";

    fn make_router() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = IngestState::new(SleepProcessor::new(store.clone()), KEY);
        (build_router(state), store)
    }

    fn post_sample(key: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(INGEST_PATH)
            .header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    async fn response_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body bytes");
        let json = serde_json::from_slice::<Value>(&bytes).expect("JSON body");
        (status, json)
    }

    #[tokio::test]
    async fn ingest_requires_key() {
        let (router, store) = make_router();
        let response = router
            .oneshot(post_sample(None, r#"{"heart_rate": 60}"#))
            .await
            .expect("call");
        let (status, json) = response_json(response).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "UNAUTHORIZED");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn ingest_rejects_wrong_key() {
        let (router, store) = make_router();
        let response = router
            .oneshot(post_sample(Some("guess"), r#"{"heart_rate": 60}"#))
            .await
            .expect("call");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unauthorized_wins_over_bad_body() {
        let (router, _) = make_router();
        let response = router.oneshot(post_sample(None, "{}")).await.expect("call");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn ingest_stores_enriched_record() {
        let (router, store) = make_router();
        let body = r#"{"heart_rate": 55, "spo2": 98, "temperature": 36.5,
                       "accel": {"x": 0, "y": 0, "z": 9.8}}"#;
        let response = router
            .oneshot(post_sample(Some(KEY), body))
            .await
            .expect("call");
        let (status, json) = response_json(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["result"], "Data saved successfully");

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(json["docId"], records[0].id.as_str());
        assert_eq!(records[0].record.sleep_score, 95);
        assert_eq!(records[0].record.sleep_stage, SleepStage::Deep);
    }

    #[tokio::test]
    async fn empty_body_is_bad_request() {
        for body in ["", "{}"] {
            let (router, store) = make_router();
            let response = router
                .oneshot(post_sample(Some(KEY), body))
                .await
                .expect("call");
            let (status, json) = response_json(response).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
            assert_eq!(json["code"], "INVALID_INPUT");
            assert!(store.is_empty());
        }
    }

    #[tokio::test]
    async fn bad_timestamp_is_bad_request() {
        let (router, store) = make_router();
        let response = router
            .oneshot(post_sample(
                Some(KEY),
                r#"{"heart_rate": 60, "custom_timestamp": "friday night"}"#,
            ))
            .await
            .expect("call");
        let (status, json) = response_json(response).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_TIMESTAMP");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn health_needs_no_key() {
        let (router, _) = make_router();
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("call");
        let (status, json) = response_json(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn encoding_failure_is_server_error() {
        let err = serde_json::from_str::<Value>("{").unwrap_err();
        let (status, json) = response_json(IngestError::Json(err).into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "JSON_ERROR");
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let (router, _) = make_router();
        let response = router
            .oneshot(post_sample(Some(KEY), "{\"heart_rate\": "))
            .await
            .expect("call");
        let (status, json) = response_json(response).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_INPUT");
    }
}
