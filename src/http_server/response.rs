//! JSON error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::service::PostError;

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub kind: &'static str,
    /// Blob paths a failed mutation left behind
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub orphaned: Vec<String>,
}

impl From<&PostError> for ErrorResponse {
    fn from(err: &PostError) -> Self {
        Self {
            error: err.to_string(),
            code: err.status_code(),
            kind: err.code(),
            orphaned: err.orphaned_blobs().to_vec(),
        }
    }
}

impl IntoResponse for PostError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
