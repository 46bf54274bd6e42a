//! Hyper-based HTTP transport.
//!
//! This module provides [`HyperTransport`], the default [`Transport`]
//! implementation, using hyper_util's legacy client.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use tower_service::Service;

use super::connector::{Connector, TimeoutConnector, build_connector};
use super::{BoxFuture, ResponseBody, Transport};
use crate::ClientError;
use crate::error::BoxError;

/// Type alias for the hyper client with the timeout-wrapped connector.
type HyperClient = Client<TimeoutConnector<Connector>, Full<Bytes>>;

/// Connection pool tuning for [`HyperTransport`].
///
/// | Option | Default |
/// |--------|---------|
/// | `max_idle_conns` | 100 |
/// | `idle_conn_timeout` | 90 s |
/// | `max_idle_conns_per_host` | 100 |
/// | `tls_handshake_timeout` | 10 s |
/// | `expect_continue_timeout` | 1 s |
///
/// hyper_util's pool only limits idle connections per host, so the
/// effective per-host limit is the smaller of `max_idle_conns` and
/// `max_idle_conns_per_host`. `expect_continue_timeout` is kept for
/// configuration parity; hyper's client never sends `Expect: 100-continue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    pub max_idle_conns: usize,
    /// `None` keeps idle connections forever.
    pub idle_conn_timeout: Option<Duration>,
    pub max_idle_conns_per_host: usize,
    /// Bounds TCP connect plus TLS handshake. `None` disables the bound.
    pub tls_handshake_timeout: Option<Duration>,
    pub expect_continue_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            max_idle_conns: 100,
            idle_conn_timeout: Some(Duration::from_secs(90)),
            max_idle_conns_per_host: 100,
            tls_handshake_timeout: Some(Duration::from_secs(10)),
            expect_continue_timeout: Duration::from_secs(1),
        }
    }
}

impl TransportOptions {
    pub(crate) fn pool_max_idle_per_host(&self) -> usize {
        self.max_idle_conns_per_host.min(self.max_idle_conns)
    }
}

/// HTTP transport using hyper_util's legacy client.
///
/// Cloning is cheap and clones share the connection pool, which is the only
/// internally synchronized state.
///
/// # Example
///
/// ```ignore
/// use fetchwire::{Client, transport::HyperTransport};
///
/// let transport = HyperTransport::builder()
///     .max_idle_conns_per_host(8)
///     .build()?;
///
/// let client = Client::builder()
///     .transport(transport)
///     .build()?;
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
    options: TransportOptions,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a new transport builder.
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::new()
    }

    /// Create a new transport with default settings.
    pub fn new() -> Result<Self, ClientError> {
        Self::builder().build()
    }

    /// Create a transport from a complete set of options.
    pub fn with_options(options: TransportOptions) -> Result<Self, ClientError> {
        HyperTransportBuilder { options }.build()
    }

    /// The options this transport was built with.
    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Send an HTTP request and receive a response with an unread body.
    pub async fn request(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<ResponseBody>, BoxError> {
        let response = self.client.request(request.map(Full::new)).await?;
        Ok(response.map(|body| body.map_err(BoxError::from).boxed_unsync()))
    }
}

impl Transport for HyperTransport {
    fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> BoxFuture<'static, Result<http::Response<ResponseBody>, BoxError>> {
        let transport = self.clone();
        Box::pin(async move { transport.request(request).await })
    }
}

/// Builder for [`HyperTransport`].
///
/// # Example
///
/// ```ignore
/// use fetchwire::transport::HyperTransportBuilder;
/// use std::time::Duration;
///
/// let transport = HyperTransportBuilder::new()
///     .idle_conn_timeout(Duration::from_secs(30))
///     .tls_handshake_timeout(Duration::from_secs(5))
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct HyperTransportBuilder {
    options: TransportOptions,
}

impl HyperTransportBuilder {
    /// Create a new transport builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all options at once.
    pub fn options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the maximum number of idle connections kept in the pool.
    ///
    /// Default: 100.
    pub fn max_idle_conns(mut self, max: usize) -> Self {
        self.options.max_idle_conns = max;
        self
    }

    /// Set how long an idle connection stays in the pool.
    ///
    /// Default: 90 seconds.
    pub fn idle_conn_timeout(mut self, timeout: Duration) -> Self {
        self.options.idle_conn_timeout = Some(timeout);
        self
    }

    /// Keep idle connections until the server closes them.
    pub fn idle_conn_timeout_none(mut self) -> Self {
        self.options.idle_conn_timeout = None;
        self
    }

    /// Set the maximum number of idle connections per host.
    ///
    /// Default: 100.
    pub fn max_idle_conns_per_host(mut self, max: usize) -> Self {
        self.options.max_idle_conns_per_host = max;
        self
    }

    /// Set the deadline for establishing a connection, TLS handshake included.
    ///
    /// Default: 10 seconds.
    pub fn tls_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.options.tls_handshake_timeout = Some(timeout);
        self
    }

    /// Set the `Expect: 100-continue` wait.
    ///
    /// Default: 1 second.
    pub fn expect_continue_timeout(mut self, timeout: Duration) -> Self {
        self.options.expect_continue_timeout = timeout;
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HyperTransport, ClientError> {
        let connector = build_connector(self.options.tls_handshake_timeout)?;

        let mut builder = Client::builder(TokioExecutor::new());

        // Required for pool_idle_timeout to take effect
        builder.pool_timer(TokioTimer::new());
        builder.pool_idle_timeout(self.options.idle_conn_timeout);
        builder.pool_max_idle_per_host(self.options.pool_max_idle_per_host());

        tracing::debug!(options = ?self.options, "building hyper transport");

        Ok(HyperTransport {
            client: builder.build(connector),
            options: self.options,
        })
    }
}

// Implement tower::Service for HyperTransport
impl Service<http::Request<Bytes>> for HyperTransport {
    type Response = http::Response<ResponseBody>;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // hyper_util legacy::Client is always ready
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<Bytes>) -> Self::Future {
        self.send(req)
    }
}
