//! HTTP error mapping for the interactive surface.
//!
//! Every core error is surfaced to the interface as a JSON body with a
//! status that tells the page whether the upload, the selection, or the
//! server itself is at fault. Nothing is retried.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use svy_ingest::IngestError;
use svy_transform::TransformError;

/// An error response for the JSON API.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// No dataset has been uploaded in this session yet.
    pub fn no_dataset() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "no dataset loaded".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(error: IngestError) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: error.to_string(),
        }
    }
}

impl From<TransformError> for ApiError {
    fn from(error: TransformError) -> Self {
        let status = match &error {
            TransformError::InvalidSelection { .. } | TransformError::DuplicateLabel { .. } => {
                StatusCode::CONFLICT
            }
            TransformError::Frame(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{error:#}"),
        }
    }
}
