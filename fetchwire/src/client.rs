//! HTTP client implementation.
//!
//! This module provides the main [`Client`] type and its dispatcher.

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info_span};

use crate::ClientError;
use crate::builder::ClientBuilder;
use crate::config::{InterceptorChain, RequestConfig};
use crate::error::{RequestError, TransportError};
use crate::response::Response;
use crate::transport::{HyperTransport, Transport};

/// HTTP client with default configuration, interceptors and a pluggable
/// transport.
///
/// The client is generic over `T`: the transport that executes requests.
/// This defaults to [`HyperTransport`].
///
/// Cloning is cheap: clones share the transport, the interceptor chain and the
/// defaults. All state is immutable after [`ClientBuilder::build`], so a client
/// can be used from many tasks at once.
///
/// # Example
///
/// ```ignore
/// use fetchwire::{CancellationToken, Client, RequestConfig};
/// use std::time::Duration;
///
/// let client = Client::builder()
///     .timeout(Duration::from_secs(10))
///     .build()?;
///
/// let cancel = CancellationToken::new();
/// let response = client
///     .dispatch(&cancel, RequestConfig::get("https://api.example.com/posts/1"))
///     .await?;
///
/// println!("{}", response.text());
/// ```
pub struct Client<T = HyperTransport> {
    /// HTTP transport.
    transport: Arc<T>,
    /// Interceptor chain, frozen at build time.
    interceptors: Arc<InterceptorChain>,
    /// Configuration merged under every request.
    defaults: Arc<RequestConfig>,
    /// Base URL for relative request URLs.
    base_url: Option<Arc<str>>,
    /// Run the response stage inside `dispatch`.
    intercept_responses: bool,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            interceptors: Arc::clone(&self.interceptors),
            defaults: Arc::clone(&self.defaults),
            base_url: self.base_url.clone(),
            intercept_responses: self.intercept_responses,
        }
    }
}

impl<T> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("interceptors", &self.interceptors)
            .field("defaults", &self.defaults)
            .field("base_url", &self.base_url)
            .field("intercept_responses", &self.intercept_responses)
            .finish_non_exhaustive()
    }
}

impl Client<HyperTransport> {
    /// Create a new [`ClientBuilder`].
    pub fn builder() -> ClientBuilder<HyperTransport> {
        ClientBuilder::new()
    }

    /// Create a client with default settings and no interceptors.
    pub fn new() -> Result<Self, ClientError> {
        ClientBuilder::new().build()
    }
}

impl<T: Transport> Client<T> {
    /// Called by [`ClientBuilder::build`]. Prefer using the builder API.
    pub(crate) fn from_parts(
        transport: Arc<T>,
        interceptors: Arc<InterceptorChain>,
        defaults: RequestConfig,
        base_url: Option<String>,
        intercept_responses: bool,
    ) -> Self {
        Self {
            transport,
            interceptors,
            defaults: Arc::new(defaults),
            base_url: base_url.map(Into::into),
            intercept_responses,
        }
    }

    /// The interceptor chain.
    ///
    /// Use it to run the response stage on a [`Response`] returned by
    /// [`dispatch`](Self::dispatch) when automatic response interception is
    /// off.
    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    /// The client-level default configuration.
    pub fn defaults(&self) -> &RequestConfig {
        &self.defaults
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Returns `true` if `dispatch` runs response interceptors itself.
    pub fn intercepts_responses(&self) -> bool {
        self.intercept_responses
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Execute one HTTP exchange.
    ///
    /// The client defaults are merged with `config`; the request interceptors
    /// run on the built request; the merged headers are then added to it and
    /// the transport is called. The exchange is abandoned as soon as `cancel`
    /// fires or the effective timeout elapses, whichever comes first.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Build`] if no request can be built from the effective
    ///   configuration.
    /// - [`ClientError::Interceptor`] if an interceptor fails. No request is
    ///   sent for request-stage failures.
    /// - [`ClientError::Transport`] for connection failures, timeouts,
    ///   cancellation and unreadable bodies.
    /// - [`ClientError::Status`] if the server answers with a status >= 400.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let cancel = CancellationToken::new();
    /// let config = RequestConfig::post("https://api.example.com/posts")
    ///     .header("content-type", "application/json")
    ///     .body(r#"{"title":"hello"}"#)
    ///     .timeout(Duration::from_secs(5));
    ///
    /// match client.dispatch(&cancel, config).await {
    ///     Ok(response) => println!("{}", response.status_text()),
    ///     Err(e) if e.is_status() => println!("server said no: {}", e),
    ///     Err(e) => return Err(e.into()),
    /// }
    /// ```
    pub async fn dispatch(
        &self,
        cancel: &CancellationToken,
        config: RequestConfig,
    ) -> Result<Response, ClientError> {
        // 1. Merge client defaults with the call configuration
        let config = self.defaults.merge(&config);
        let method = config.method.clone().unwrap_or(Method::GET);
        let url = config.target_url(self.base_url())?;

        let span = info_span!(
            "http.request",
            http.method = %method,
            url = %url,
            sent.method = tracing::field::Empty,
            sent.url = tracing::field::Empty,
        );
        self.execute(cancel, config, method, url)
            .instrument(span)
            .await
    }

    /// Alias of [`dispatch`](Self::dispatch).
    pub async fn cancelable_request(
        &self,
        cancel: &CancellationToken,
        config: RequestConfig,
    ) -> Result<Response, ClientError> {
        self.dispatch(cancel, config).await
    }

    /// Dispatch with a token that is never cancelled.
    ///
    /// The effective timeout still applies.
    pub async fn send(&self, config: RequestConfig) -> Result<Response, ClientError> {
        self.dispatch(&CancellationToken::new(), config).await
    }

    /// Send a `GET` request.
    pub async fn get(
        &self,
        cancel: &CancellationToken,
        url: impl Into<String>,
    ) -> Result<Response, ClientError> {
        self.dispatch(cancel, RequestConfig::get(url)).await
    }

    /// Send a `POST` request with the given body.
    pub async fn post(
        &self,
        cancel: &CancellationToken,
        url: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Result<Response, ClientError> {
        self.dispatch(cancel, RequestConfig::post(url).body(body))
            .await
    }

    /// Send a `PUT` request with the given body.
    pub async fn put(
        &self,
        cancel: &CancellationToken,
        url: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Result<Response, ClientError> {
        self.dispatch(cancel, RequestConfig::put(url).body(body)).await
    }

    /// Send a `PATCH` request with the given body.
    pub async fn patch(
        &self,
        cancel: &CancellationToken,
        url: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Result<Response, ClientError> {
        self.dispatch(cancel, RequestConfig::patch(url).body(body))
            .await
    }

    /// Send a `DELETE` request.
    pub async fn delete(
        &self,
        cancel: &CancellationToken,
        url: impl Into<String>,
    ) -> Result<Response, ClientError> {
        self.dispatch(cancel, RequestConfig::delete(url)).await
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        config: RequestConfig,
        method: Method,
        url: String,
    ) -> Result<Response, ClientError> {
        // 2. Build HTTP request
        let request = http::Request::builder()
            .method(method)
            .uri(url.as_str())
            .body(config.body.clone().unwrap_or_default())
            .map_err(|e| ClientError::Build(e.to_string()))?;

        // 3. Apply request interceptors
        let mut request = self.interceptors.apply_request(request)?;

        // 4. Copy headers
        for (name, value) in config.headers.iter() {
            request.headers_mut().append(name.clone(), value.clone());
        }

        // Interceptors may have rewritten the target; report what is sent.
        let method = request.method().clone();
        let url = request.uri().to_string();
        let span = tracing::Span::current();
        span.record("sent.method", tracing::field::display(&method));
        span.record("sent.url", tracing::field::display(&url));

        // 5. Send request, racing cancellation and the deadline
        let exchange = self.round_trip(request, method, url);
        let result: Result<Response, ClientError> = match config.effective_timeout() {
            Some(limit) => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(TransportError::Cancelled.into()),
                result = tokio::time::timeout(limit, exchange) => {
                    result.unwrap_or_else(|_| Err(TransportError::Timeout(limit).into()))
                }
            },
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(TransportError::Cancelled.into()),
                result = exchange => result,
            },
        };

        let response = result.inspect_err(|e| tracing::debug!(error = %e, "request failed"))?;

        // 8. Apply response interceptors if enabled
        if self.intercept_responses {
            return Ok(self.interceptors.apply_response(response)?);
        }
        Ok(response)
    }

    async fn round_trip(
        &self,
        request: http::Request<Bytes>,
        method: Method,
        url: String,
    ) -> Result<Response, ClientError> {
        let response = self
            .transport
            .send(request)
            .await
            .map_err(TransportError::Request)?;

        let (parts, body) = response.into_parts();
        tracing::debug!(status = parts.status.as_u16(), "received response headers");

        // 6. Check response status
        if parts.status.as_u16() >= 400 {
            let body = body
                .collect()
                .await
                .map(|collected| collected.to_bytes())
                .unwrap_or_default();
            return Err(RequestError::new(parts.status, method, url, body).into());
        }

        // 7. Get response body
        let body = body
            .collect()
            .await
            .map_err(TransportError::Body)?
            .to_bytes();

        Ok(Response::from_parts(parts, body))
    }
}
