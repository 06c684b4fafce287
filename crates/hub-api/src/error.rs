//! API error taxonomy and response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use forgehub_client::ForgeError;
use forgehub_core::HubError;
use serde::Serialize;

/// Errors surfaced by the API boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The upstream forge answered with an unexpected status, or was
    /// unreachable. Carries the status to propagate to the caller.
    #[error("upstream error ({status}): {body}")]
    Upstream {
        /// Status to propagate; 502 when the forge never answered.
        status: u16,
        /// Upstream body or transport error, for diagnostics.
        body: String,
    },

    /// Malformed caller credentials, or upstream 401 during streaming.
    #[error("unauthorized")]
    Unauthorized,

    /// Neither refresh nor cache could satisfy the lookup.
    #[error("dataset not found: {0}")]
    NotFound(String),

    /// Store or internal failure.
    #[error(transparent)]
    Internal(#[from] HubError),
}

impl From<ForgeError> for ApiError {
    fn from(err: ForgeError) -> Self {
        let status = err.upstream_status().unwrap_or(502);
        match err {
            ForgeError::Upstream { status, body } => ApiError::Upstream { status, body },
            other => ApiError::Upstream {
                status,
                body: other.to_string(),
            },
        }
    }
}

impl ApiError {
    /// Whether this error came from the upstream forge, making a stale-cache
    /// fallback appropriate.
    pub fn is_upstream(&self) -> bool {
        matches!(self, ApiError::Upstream { .. })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
