//! Streaming file handles with guaranteed connection cleanup.
//!
//! A [`FileStream`] bundles the upstream response status and headers with an
//! unread body and a [`StreamGuard`]. The guard's release hook fires exactly
//! once on every exit path: explicit [`FileStream::close`], a fully drained
//! relay, an error mid-body, or the relay being dropped partway through when
//! the downstream client disconnects. The hook is the single place where the
//! upstream connection is given back, so nothing here relies on garbage
//! collection ordering.

use crate::error::ForgeError;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Guard holding the release hook for one upstream connection.
///
/// The hook fires at most once: explicit release and drop race through the
/// same `Option::take`.
pub struct StreamGuard {
    on_release: Option<Box<dyn FnOnce() + Send>>,
}

impl StreamGuard {
    /// Create a guard that runs `on_release` when the connection is let go.
    pub fn new(on_release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_release: Some(Box::new(on_release)),
        }
    }

    fn release(&mut self) {
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for StreamGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamGuard")
            .field("armed", &self.on_release.is_some())
            .finish()
    }
}

/// Handle over an open upstream streaming response.
///
/// The body has not been read; the caller owns the lifecycle and must either
/// [`close`](Self::close) the handle or consume it via
/// [`into_body`](Self::into_body).
pub struct FileStream {
    status: StatusCode,
    headers: HeaderMap,
    body: BoxStream<'static, Result<Bytes, ForgeError>>,
    guard: StreamGuard,
}

impl FileStream {
    /// Build a handle from an open reqwest response.
    pub(crate) fn from_response(response: reqwest::Response, guard: StreamGuard) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes_stream().map(|c| c.map_err(ForgeError::from));
        Self {
            status,
            headers,
            body: body.boxed(),
            guard,
        }
    }

    /// Build a handle from raw parts, standing in for an upstream
    /// connection in tests that drive the relay lifecycle directly.
    pub fn from_parts(
        status: StatusCode,
        headers: HeaderMap,
        body: impl Stream<Item = Result<Bytes, ForgeError>> + Send + 'static,
        guard: StreamGuard,
    ) -> Self {
        Self {
            status,
            headers,
            body: body.boxed(),
            guard,
        }
    }

    /// Upstream response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Upstream response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Close the handle without reading any body bytes.
    pub fn close(mut self) {
        self.guard.release();
    }

    /// Consume the handle into a relay stream over the body chunks.
    pub fn into_body(self) -> RelayStream {
        RelayStream {
            body: self.body,
            guard: self.guard,
        }
    }
}

impl fmt::Debug for FileStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStream")
            .field("status", &self.status)
            .field("guard", &self.guard)
            .finish()
    }
}

/// Lazy chunk stream relaying an upstream body.
///
/// Finite and not restartable. Releases the upstream connection when the
/// body drains, when an error surfaces, or when the stream is dropped early.
pub struct RelayStream {
    body: BoxStream<'static, Result<Bytes, ForgeError>>,
    guard: StreamGuard,
}

impl Stream for RelayStream {
    type Item = Result<Bytes, ForgeError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.body.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => Poll::Ready(Some(Ok(chunk))),
            Poll::Ready(Some(Err(e))) => {
                this.guard.release();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.guard.release();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl fmt::Debug for RelayStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayStream")
            .field("guard", &self.guard)
            .finish()
    }
}
