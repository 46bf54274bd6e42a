//! Response type returned by a successful dispatch.
//!
//! [`Response`] owns a fully read body; the transport stream is already
//! closed by the time the caller sees it.

use std::borrow::Cow;

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use serde::de::DeserializeOwned;

use crate::ClientError;

/// A received HTTP response with its body materialised.
///
/// Response interceptors receive a `Response` by value and return the one
/// the next interceptor should see, so any field may be replaced.
///
/// # Example
///
/// ```ignore
/// let response = client.get(&cancel, "https://api.example.com/posts/1").await?;
///
/// println!("{}", response.status_text()); // "200 OK"
/// let post: Post = response.json()?;
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Create a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            version: Version::HTTP_11,
            headers,
            body,
        }
    }

    pub(crate) fn from_parts(parts: http::response::Parts, body: Bytes) -> Self {
        Self {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Status line text, e.g. `"200 OK"`.
    pub fn status_text(&self) -> String {
        match self.status.canonical_reason() {
            Some(reason) => format!("{} {}", self.status.as_u16(), reason),
            None => self.status.as_u16().to_string(),
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The response body. Empty (never absent) when the server sent none.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body decoded lossily as UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn set_headers(&mut self, headers: HeaderMap) {
        self.headers = headers;
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Consume the response, keeping only the body.
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Decompose into status, headers and body.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}
