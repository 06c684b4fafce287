//! Error types for the forge client.

use std::time::Duration;

/// Errors that can occur when talking to the upstream forge.
#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    /// HTTP transport error (connection, DNS, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream accepted the connection but produced no response
    /// headers within the allowed window
    #[error("upstream produced no response within {0:?}")]
    HeadersTimeout(Duration),

    /// Unexpected non-2xx response from the forge
    #[error("upstream error ({status}): {body}")]
    Upstream {
        /// HTTP status code reported upstream
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl ForgeError {
    /// Upstream status code, when the forge answered at all.
    ///
    /// Transport errors carry no status and return `None`; the boundary
    /// maps those to 502.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ForgeError::Upstream { status, .. } => Some(*status),
            ForgeError::Http(e) => e.status().map(|s| s.as_u16()),
            ForgeError::HeadersTimeout(_) => None,
            ForgeError::Config(_) => None,
        }
    }
}

/// Result type for forge client operations.
pub type Result<T> = std::result::Result<T, ForgeError>;
