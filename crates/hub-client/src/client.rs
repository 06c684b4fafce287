//! HTTP client for the upstream forge.

use crate::config::ForgeConfig;
use crate::error::{ForgeError, Result};
use crate::stream::{FileStream, StreamGuard};
use crate::types::{ContentsResponse, TreeResponse};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{AUTHORIZATION, RANGE, USER_AGENT};
use reqwest::StatusCode;
use std::sync::Arc;

/// Client for the forge's structured REST API and raw-content endpoint.
///
/// One instance owns a single connection pool; tokens are caller-supplied
/// per call rather than stored, since each inbound request may carry its own
/// credentials.
pub struct ForgeClient {
    http: reqwest::Client,
    config: ForgeConfig,
}

impl ForgeClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ForgeConfig) -> Result<Self> {
        config.validate()?;

        // No client-wide total timeout: it would also bound the body relay
        // of an open stream. Tree/content fetches set per-request timeouts.
        let http = reqwest::Client::builder()
            .connect_timeout(config.stream_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { http, config })
    }

    /// The configured REST API base URL.
    pub fn api_base(&self) -> &str {
        &self.config.api_base
    }

    /// The configured raw-content base URL.
    pub fn raw_base(&self) -> &str {
        &self.config.raw_base
    }

    // =========================================================================
    // Upstream Operations
    // =========================================================================

    /// Fetch the full recursive tree listing for one revision.
    ///
    /// Fails with `ForgeError::Upstream` on any non-2xx response.
    pub async fn get_tree(
        &self,
        owner: &str,
        repo: &str,
        revision: &str,
        token: Option<&str>,
    ) -> Result<TreeResponse> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}",
            self.config.api_base, owner, repo, revision
        );

        tracing::debug!(url = %url, revision = %revision, "fetching tree");

        let response = self
            .request(&url, token)
            .query(&[("recursive", "1")])
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::upstream_error(response).await);
        }

        Ok(response.json().await?)
    }

    /// Fetch a single file's content through the structured API.
    ///
    /// The forge returns the body base64-encoded inside a JSON envelope.
    /// Returns `Ok(None)` when the file does not exist (404), when the
    /// envelope carries no content, or when the payload is not valid UTF-8
    /// text; other non-2xx statuses fail with `ForgeError::Upstream`.
    pub async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        revision: &str,
        token: Option<&str>,
    ) -> Result<Option<String>> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base, owner, repo, path
        );

        tracing::debug!(url = %url, revision = %revision, "fetching file content");

        let response = self
            .request(&url, token)
            .query(&[("ref", revision)])
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Self::upstream_error(response).await);
        }

        let payload: ContentsResponse = response.json().await?;
        Ok(payload.content.as_deref().and_then(decode_text_content))
    }

    /// Open a streaming connection to a raw file, forwarding an optional
    /// byte-range header verbatim.
    ///
    /// The upstream must deliver response headers within `stream_timeout`;
    /// once the stream is open, no timeout applies to the body relay. The
    /// body is not consumed; the returned [`FileStream`] owns the connection
    /// and releases it exactly once regardless of how many bytes are
    /// ultimately read.
    pub async fn stream_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        revision: &str,
        token: Option<&str>,
        range_header: Option<&str>,
    ) -> Result<FileStream> {
        let url = format!(
            "{}/{}/{}/raw/{}/{}",
            self.config.raw_base, owner, repo, revision, path
        );

        tracing::debug!(url = %url, range = ?range_header, "opening file stream");

        let mut request = self.request(&url, token);
        if let Some(range) = range_header {
            request = request.header(RANGE, range);
        }

        // Bounds time-to-headers only; the open body relay stays unbounded.
        let response = tokio::time::timeout(self.config.stream_timeout, request.send())
            .await
            .map_err(|_| ForgeError::HeadersTimeout(self.config.stream_timeout))??;
        let status = response.status().as_u16();

        let guard = StreamGuard::new(move || {
            tracing::debug!(url = %url, status = status, "released upstream stream");
        });

        Ok(FileStream::from_response(response, guard))
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Start a GET request with the common headers applied.
    fn request(&self, url: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .get(url)
            .header(USER_AGENT, &self.config.user_agent);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }
        request
    }

    /// Convert a non-2xx response into an upstream error, capturing the body.
    async fn upstream_error(response: reqwest::Response) -> ForgeError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        tracing::warn!(status = status, body = %body, "upstream request failed");

        ForgeError::Upstream { status, body }
    }
}

/// Decode a base64 JSON-envelope payload into UTF-8 text.
///
/// Undecodable content is treated as non-text/unavailable rather than an
/// error. The forge may wrap the base64 body in whitespace.
fn decode_text_content(encoded: &str) -> Option<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    let bytes = BASE64.decode(compact).ok()?;
    String::from_utf8(bytes).ok()
}

/// Arc-wrapped client for shared ownership across request handlers.
pub type SharedForgeClient = Arc<ForgeClient>;
