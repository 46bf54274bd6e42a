//! A small HTTP client with default configuration, interceptors and
//! cancellation.
//!
//! Every request is described by a [`RequestConfig`]. The client merges it on
//! top of its own defaults, runs the request through an ordered chain of
//! interceptors, and hands it to a pooled transport. The call can be abandoned
//! at any time through a [`CancellationToken`] or a deadline.
//!
//! ## Features
//!
//! - Client-level defaults with per-call overrides
//! - Header replacement on merge (per name, case-insensitive)
//! - Query parameters encoded with `serde_qs`
//! - Ordered request and response interceptors
//! - Cancellation and per-request timeouts
//! - Structured errors for status codes >= 400
//! - Connection pooling with HTTP/1.1 and HTTP/2
//!
//! ## Example
//!
//! ```ignore
//! use fetchwire::{CancellationToken, Client, RequestConfig};
//! use std::time::Duration;
//!
//! let client = Client::builder()
//!     .base_url("https://jsonplaceholder.typicode.com")
//!     .defaults(RequestConfig::new().header("accept", "application/json"))
//!     .build()?;
//!
//! let cancel = CancellationToken::new();
//! let response = client
//!     .dispatch(
//!         &cancel,
//!         RequestConfig::get("/posts").param("userId", "1").timeout(Duration::from_secs(5)),
//!     )
//!     .await?;
//!
//! println!("{} {}", response.status_text(), response.text());
//! ```
//!
//! ## Merging
//!
//! The effective configuration of a request is `defaults.merge(&call)`:
//!
//! | Field | Rule |
//! |-------|------|
//! | method, url, body, timeout | the call value wins when set |
//! | headers | each header name in the call replaces every default value for that name |
//! | params | the call value wins per key |
//!
//! A call timeout of `Duration::ZERO` disables a default deadline.
//!
//! ## Interceptors
//!
//! Interceptors run in registration order. The first failure stops the chain
//! and is reported as [`ClientError::Interceptor`] with the stage and the
//! position of the failing interceptor.
//!
//! [`Client::dispatch`] always runs the request stage. The response stage runs
//! inside `dispatch` only when the client is built with
//! [`ClientBuilder::intercept_responses`]; otherwise callers apply it with
//! [`Client::interceptors`]:
//!
//! ```ignore
//! let response = client.get(&cancel, "/posts/1").await?;
//! let response = client.interceptors().apply_response(response)?;
//! ```
//!
//! ## Cancellation
//!
//! Cancelling the token or reaching the effective timeout drops the in-flight
//! exchange and returns [`TransportError::Cancelled`] or
//! [`TransportError::Timeout`]:
//!
//! ```ignore
//! let cancel = CancellationToken::new();
//! let handle = tokio::spawn({
//!     let client = client.clone();
//!     let cancel = cancel.clone();
//!     async move { client.get(&cancel, "/slow").await }
//! });
//!
//! cancel.cancel();
//! assert!(handle.await?.unwrap_err().is_cancelled());
//! ```
//!
//! ## Retries
//!
//! The client never retries. Callers loop on the errors they consider
//! transient:
//!
//! ```ignore
//! let mut attempt = 0;
//! let response = loop {
//!     match client.get(&cancel, "/flaky").await {
//!         Err(e) if e.status().is_some_and(|s| s.is_server_error()) && attempt < 3 => {
//!             attempt += 1;
//!         }
//!         other => break other?,
//!     }
//! };
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Dependencies |
//! |---------|-------------|--------------|
//! | `tls` (default) | HTTPS with rustls, ring and the system root certificates | `hyper-rustls`, `rustls`, `rustls-native-certs` |
//!
//! Without `tls` only `http://` URLs can be requested.

mod builder;
mod client;
pub mod config;
mod error;
mod response;
pub mod transport;

pub use builder::ClientBuilder;
pub use client::Client;
pub use error::{BoxError, ClientError, InterceptorError, RequestError, Stage, TransportError};

// Re-export from config module
pub use config::{
    HeaderInterceptor, HttpRequest, Intercept, Interceptor, InterceptorChain, RequestConfig, merge,
};

pub use response::Response;

// Re-export transport types at the top level for convenience
pub use transport::{HyperTransport, HyperTransportBuilder, Transport, TransportOptions};

// Re-export types that appear in the public API
pub use bytes::Bytes;
pub use http;
pub use tokio_util::sync::CancellationToken;
