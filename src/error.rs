//! Error types for the nfse-extract service.
//!
//! One enum covers the whole request path, but its variants fall into two
//! families with different HTTP mappings:
//!
//! * **Client errors** — the upload itself is unusable (missing field, wrong
//!   media type, empty body). Mapped to 4xx; the caller can fix these.
//!
//! * **Upstream errors** — the extraction API timed out, failed, or returned
//!   content that does not satisfy the invoice schema. Mapped to 502/504; the
//!   caller did nothing wrong and may retry later.
//!
//! Every variant is converted at the endpoint boundary into a JSON body of
//! the form `{"error": "<message>"}` with the status from
//! [`ExtractError::status_code`]. Nothing is swallowed and nothing is retried:
//! a request yields either a complete invoice or exactly one error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors surfaced by the extraction endpoint and the upstream client.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Client errors ─────────────────────────────────────────────────────
    /// The multipart form carried no `file` field.
    #[error("No file supplied. Send the PDF as multipart/form-data under the field name 'file'.")]
    MissingInput,

    /// The upload is not a PDF (declared media type, extension, or magic bytes).
    #[error("Unsupported media type: {detail}. Only PDF documents are accepted.")]
    UnsupportedMediaType { detail: String },

    /// The upload is present but unusable (empty, oversized, unreadable field).
    #[error("Invalid input: {detail}")]
    InvalidInput { detail: String },

    // ── Upstream errors ───────────────────────────────────────────────────
    /// The extraction API did not answer within the configured bound.
    #[error("Extraction API timed out after {secs}s")]
    UpstreamTimeout { secs: u64 },

    /// The extraction API answered with a non-success status, or the request
    /// never completed (connection refused, TLS failure, closed socket).
    #[error("Extraction API request failed: {detail}")]
    UpstreamFailure { detail: String },

    /// The extraction API answered 2xx but the content does not match the
    /// invoice schema (unparseable JSON, missing required field, bad date).
    #[error("Extraction API returned malformed content: {detail}")]
    MalformedUpstreamResponse { detail: String },

    // ── Config errors (startup only, never per-request) ───────────────────
    /// Required credential absent from the environment.
    #[error("Missing API credential: set {var} before starting the service")]
    MissingApiKey { var: &'static str },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ExtractError {
    /// HTTP status for this error kind.
    ///
    /// Client input errors map to 400 — including the media-type check, since
    /// the endpoint accepts exactly one type and a mismatch is a plain bad
    /// request. Upstream failures map to 502, timeouts to 504. Config errors
    /// abort startup; the 500 mapping exists only so the enum stays total.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExtractError::MissingInput
            | ExtractError::UnsupportedMediaType { .. }
            | ExtractError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ExtractError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ExtractError::UpstreamFailure { .. }
            | ExtractError::MalformedUpstreamResponse { .. } => StatusCode::BAD_GATEWAY,
            ExtractError::MissingApiKey { .. } | ExtractError::InvalidConfig(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Wire shape of every error response: `{"error": "<message>"}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ExtractError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
