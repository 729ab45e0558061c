use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use shelfcheck_ocr::{PipelineError, PreprocessError};
use thiserror::Error;

/// Every failure a `/scan` request can end in. Rendered as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image data provided")]
    MissingImage,
    #[error("Image payload too large")]
    TooLarge,
    #[error("{0}")]
    BadImage(String),
    #[error("No expiry date found in image.")]
    NoExpiryDate,
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingImage | ApiError::BadImage(_) | ApiError::NoExpiryDate => {
                StatusCode::BAD_REQUEST
            }
            ApiError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Preprocess(PreprocessError::Encode(_)) => ApiError::Internal(e.to_string()),
            PipelineError::Preprocess(_) => ApiError::BadImage(e.to_string()),
            PipelineError::Io(_) | PipelineError::Ocr(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Error during processing: {self}");
        } else {
            tracing::warn!("Rejected scan: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
