use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderValue, Method};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::inference::{InferenceResponse, InferenceService};

/// Upload size accepted by `/predict`.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    service: Arc<InferenceService>,
}

impl AppState {
    pub fn new(service: Arc<InferenceService>) -> Self {
        Self { service }
    }
}

/// Health endpoint response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub labels: Vec<&'static str>,
    pub feature_len: usize,
}

/// Build the Axum router with all handlers.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `"*"` anywhere in the list allows every origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(origin = %origin, error = %err, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Run the HTTP server loop until ctrl-c.
pub async fn run_server(service: Arc<InferenceService>, config: &ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("parsing bind address {}", config.bind_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", addr))?;

    tracing::info!(%addr, "Emotion recognition service listening");

    let router = build_router(AppState::new(service), config);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP router")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_loaded: true,
        labels: state.service.labels().names(),
        feature_len: state.service.feature_len(),
    })
}

pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<InferenceResponse> {
    let bytes = match read_upload(multipart).await {
        Ok(bytes) => bytes,
        Err(reason) => {
            tracing::warn!(%reason, "Rejecting upload");
            return Json(InferenceResponse::invalid_audio());
        }
    };

    tracing::info!(bytes = bytes.len(), "Received audio upload");

    let service = state.service.clone();
    match tokio::task::spawn_blocking(move || service.predict_bytes(&bytes)).await {
        Ok(response) => Json(response),
        Err(err) => {
            tracing::error!(error = %err, "Inference task failed");
            Json(InferenceResponse::invalid_audio())
        }
    }
}

/// Bytes of the first `file` field.
async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> Result<Bytes, String> {
    let mut multipart = multipart.map_err(|err| err.body_text())?;
    while let Some(field) = multipart.next_field().await.map_err(|err| err.body_text())? {
        if field.name() == Some("file") {
            if let Some(filename) = field.file_name() {
                tracing::debug!(filename, "Reading uploaded file");
            }
            return field.bytes().await.map_err(|err| err.body_text());
        }
    }
    Err("multipart form has no `file` field".to_string())
}
