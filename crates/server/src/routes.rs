use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use shelfcheck_core::{ExpiryEvaluator, ExpiryVerdict};
use shelfcheck_ocr::{OcrBackend, ScanPipeline};

use crate::error::ApiError;

/// Application state shared across routes.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<ScanPipeline<Box<dyn OcrBackend>>>,
}

impl AppState {
    pub fn new(backend: Box<dyn OcrBackend>) -> Self {
        Self { pipeline: Arc::new(ScanPipeline::new(backend)) }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Base64 image, optionally as a `data:` URL.
    pub image: Option<String>,
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "OK" }))
        .route("/scan", post(scan))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

/// Handler for `POST /scan`.
async fn scan(
    State(state): State<AppState>,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ExpiryVerdict>, ApiError> {
    let image = match body {
        Ok(Json(ScanRequest { image: Some(image) })) if !image.trim().is_empty() => image,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(ApiError::TooLarge)
        }
        _ => return Err(ApiError::MissingImage),
    };

    // Decoding, binarization and OCR are CPU-bound and may call into native code.
    let pipeline = Arc::clone(&state.pipeline);
    let outcome = tokio::task::spawn_blocking(move || pipeline.scan_payload(&image))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let found = match &outcome.extraction {
        Ok(found) => found,
        Err(miss) => {
            tracing::info!(reason = %miss, "no expiry date in scan");
            return Err(ApiError::NoExpiryDate);
        }
    };

    let verdict = ExpiryEvaluator::verdict(found.date);
    tracing::info!(
        date = %found.date,
        format = %found.format,
        is_expired = verdict.is_expired,
        "scan evaluated"
    );
    Ok(Json(verdict))
}
