//! API error types.

use std::error::Error as StdError;

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http_body_util::LengthLimitError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vidlens_reducer::{ProviderError, UnknownStrategy};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No video file uploaded")]
    NoVideo,

    #[error("{0}")]
    BadRequest(String),

    #[error("Upload exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    /// `details` is `None` when the deployment hides provider messages.
    #[error("Analysis failed")]
    AnalysisFailed { details: Option<String> },
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn analysis_failed(details: impl Into<String>, expose_details: bool) -> Self {
        Self::AnalysisFailed {
            details: expose_details.then(|| details.into()),
        }
    }

    /// Map a provider failure. The message is always logged, but only
    /// returned to the client when `expose_details` is set.
    pub fn from_provider(err: ProviderError, expose_details: bool) -> Self {
        match err {
            ProviderError::EmptyVideo => Self::NoVideo,
            other => {
                tracing::error!("Analysis failed: {}", other);
                Self::analysis_failed(other.to_string(), expose_details)
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoVideo | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::AnalysisFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Translate a multipart read failure, keeping 413 for oversized bodies.
    pub fn from_multipart(err: MultipartError, limit: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE || exceeded_body_limit(&err) {
            Self::PayloadTooLarge(limit)
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

/// True when a body length limit sits anywhere in the error's source chain.
fn exceeded_body_limit(err: &(dyn StdError + 'static)) -> bool {
    std::iter::successors(Some(err), |e| (*e).source()).any(|e| e.is::<LengthLimitError>())
}

impl From<UnknownStrategy> for ApiError {
    fn from(err: UnknownStrategy) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// JSON error body: `{ "error": ..., "details": ... }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            ApiError::AnalysisFailed { details } => ErrorResponse {
                error: "Analysis failed".to_string(),
                details,
            },
            other => ErrorResponse {
                error: other.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
