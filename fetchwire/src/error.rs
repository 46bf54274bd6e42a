//! Client-side error types.
//!
//! This module provides [`ClientError`], the error type returned by
//! [`Client::dispatch`](crate::Client::dispatch) and friends. Each variant
//! corresponds to the stage that produced it, so callers can branch on cause:
//!
//! | Variant | Stage |
//! |---------|-------|
//! | [`ClientError::Build`] | building the request from the effective config |
//! | [`ClientError::Interceptor`] | request or response interceptors |
//! | [`ClientError::Transport`] | network, timeout, cancellation, body read |
//! | [`ClientError::Status`] | the server answered with a status >= 400 |
//! | [`ClientError::Decode`] | JSON decoding of a response body |

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode};

/// Type-erased error used for interceptor and transport causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The effective configuration could not be turned into a request
    /// (invalid URL, method, header or query parameters).
    #[error("building request: {0}")]
    Build(String),

    /// An interceptor failed; no request was sent (request stage) or the
    /// response was discarded (response stage).
    #[error("applying {stage} interceptors: {0}", stage = .0.stage)]
    Interceptor(#[source] InterceptorError),

    /// Transport-level failure: connection error, deadline, cancellation or
    /// a broken response body.
    #[error("executing request: {0}")]
    Transport(#[source] TransportError),

    /// The server answered with a status code >= 400.
    #[error(transparent)]
    Status(#[from] RequestError),

    /// The response body is not valid JSON for the requested type.
    #[error("parsing JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Returns `true` for HTTP status failures.
    pub fn is_status(&self) -> bool {
        matches!(self, ClientError::Status(_))
    }

    /// Returns `true` for transport-level failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// Returns `true` for interceptor failures of either stage.
    pub fn is_interceptor(&self) -> bool {
        matches!(self, ClientError::Interceptor(_))
    }

    /// Returns `true` if the request hit its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Transport(TransportError::Timeout(_)))
    }

    /// Returns `true` if the request was cancelled through its token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Transport(TransportError::Cancelled))
    }

    /// The HTTP status of a [`ClientError::Status`] failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status(err) => Some(err.status),
            _ => None,
        }
    }

    /// The underlying [`RequestError`], if this is a status failure.
    pub fn as_request_error(&self) -> Option<&RequestError> {
        match self {
            ClientError::Status(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InterceptorError> for ClientError {
    fn from(err: InterceptorError) -> Self {
        ClientError::Interceptor(err)
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Transport(err)
    }
}

/// Which half of the interceptor pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Request,
    Response,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Request => f.write_str("request"),
            Stage::Response => f.write_str("response"),
        }
    }
}

/// Failure of a single interceptor, identified by its zero-based position in
/// the chain.
#[derive(Debug, thiserror::Error)]
#[error("{stage} interceptor {index} failed: {source}")]
pub struct InterceptorError {
    pub stage: Stage,
    pub index: usize,
    #[source]
    pub source: BoxError,
}

impl InterceptorError {
    pub(crate) fn new(stage: Stage, index: usize, source: BoxError) -> Self {
        Self {
            stage,
            index,
            source,
        }
    }
}

/// Transport-level failure. Never produced for HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport could not complete the exchange (DNS, connect, TLS,
    /// protocol error, closed connection).
    #[error("request failed: {0}")]
    Request(#[source] BoxError),

    /// The effective timeout elapsed before the response was fully received.
    #[error("deadline of {0:?} exceeded")]
    Timeout(Duration),

    /// The caller's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,

    /// Response headers arrived but the body could not be read.
    #[error("reading response body: {0}")]
    Body(#[source] BoxError),
}

/// Structured HTTP failure for responses with a status code >= 400.
///
/// The response itself is not returned to the caller; the body is kept here
/// for diagnostics and may be empty if it could not be read.
#[derive(Debug, Clone, thiserror::Error)]
#[error(
    "request to {method} {url} failed with status code {}: {message}\nResponse Body: {}",
    .status.as_u16(),
    String::from_utf8_lossy(.body)
)]
pub struct RequestError {
    pub status: StatusCode,
    pub method: Method,
    pub url: String,
    /// Canonical reason phrase for `status`, e.g. "Not Found".
    pub message: String,
    pub body: Bytes,
}

impl RequestError {
    pub(crate) fn new(status: StatusCode, method: Method, url: String, body: Bytes) -> Self {
        Self {
            message: status.canonical_reason().unwrap_or_default().to_string(),
            status,
            method,
            url,
            body,
        }
    }

    /// The response body decoded lossily as UTF-8.
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
