//! Client builder for the fetchwire client.
//!
//! Provides a fluent API for configuring and building a [`Client`].

use std::sync::Arc;
use std::time::Duration;

use crate::ClientError;
use crate::client::Client;
use crate::config::{Intercept, InterceptorChain, RequestConfig};
use crate::transport::{HyperTransport, Transport, TransportOptions};

type MakeTransport<T> = Box<dyn FnOnce(TransportOptions) -> Result<T, ClientError> + Send>;

/// Builder for creating a [`Client`].
///
/// # Example
///
/// ```ignore
/// use fetchwire::{Client, HeaderInterceptor, RequestConfig};
/// use std::time::Duration;
///
/// let client = Client::builder()
///     .base_url("https://api.example.com")
///     .defaults(RequestConfig::new().header("accept", "application/json"))
///     .timeout(Duration::from_secs(10))
///     .with_interceptor(HeaderInterceptor::new("x-api-key", "secret"))
///     .build()?;
/// ```
pub struct ClientBuilder<T = HyperTransport> {
    /// Configuration merged under every request.
    defaults: RequestConfig,
    /// Base URL that relative request URLs are joined onto.
    base_url: Option<String>,
    /// Interceptors in registration order.
    interceptors: InterceptorChain,
    /// Run the response stage automatically in `dispatch`.
    intercept_responses: bool,
    /// Pool settings handed to the transport factory.
    transport_options: TransportOptions,
    /// Produces the transport at build time.
    make_transport: MakeTransport<T>,
}

impl<T> std::fmt::Debug for ClientBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("defaults", &self.defaults)
            .field("base_url", &self.base_url)
            .field("interceptor_count", &self.interceptors.len())
            .field("intercept_responses", &self.intercept_responses)
            .field("transport_options", &self.transport_options)
            .finish_non_exhaustive()
    }
}

impl Default for ClientBuilder<HyperTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder<HyperTransport> {
    /// Create a new builder that uses [`HyperTransport`].
    pub fn new() -> Self {
        Self {
            defaults: RequestConfig::new(),
            base_url: None,
            interceptors: InterceptorChain::new(),
            intercept_responses: false,
            transport_options: TransportOptions::default(),
            make_transport: Box::new(HyperTransport::with_options),
        }
    }
}

impl<T: Transport> ClientBuilder<T> {
    /// Set the configuration every request starts from.
    ///
    /// Replaces any defaults set earlier, including a [`timeout`](Self::timeout).
    pub fn defaults(mut self, defaults: RequestConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Set a base URL. Request URLs without a scheme are joined onto it.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = Client::builder()
    ///     .base_url("http://localhost:3000/api")
    ///     .build()?;
    ///
    /// // Requests http://localhost:3000/api/posts/1
    /// client.get(&cancel, "/posts/1").await?;
    /// ```
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = (!base_url.is_empty()).then_some(base_url);
        self
    }

    /// Set the default timeout for all requests.
    ///
    /// A per-call [`RequestConfig::timeout`] overrides it; `Duration::ZERO`
    /// disables the deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.defaults.timeout = Some(timeout);
        self
    }

    /// Add an interceptor to the end of the chain.
    ///
    /// Interceptors run in the order they are added.
    pub fn with_interceptor<I: Intercept + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.register(interceptor);
        self
    }

    /// Add an already shared interceptor to the end of the chain.
    pub fn with_shared_interceptor(mut self, interceptor: Arc<dyn Intercept>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Run response interceptors on every successful response.
    ///
    /// Off by default: `dispatch` only runs the request stage, and callers
    /// apply the response stage themselves through
    /// [`Client::interceptors`](crate::Client::interceptors). When enabled, a
    /// failing response interceptor turns a successful exchange into
    /// [`ClientError::Interceptor`].
    pub fn intercept_responses(mut self, enabled: bool) -> Self {
        self.intercept_responses = enabled;
        self
    }

    /// Set the connection pool options for the default transport.
    ///
    /// Ignored once a custom transport is supplied with
    /// [`transport`](Self::transport).
    pub fn transport_options(mut self, options: TransportOptions) -> Self {
        self.transport_options = options;
        self
    }

    /// Use a custom transport instead of [`HyperTransport`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// let transport = HyperTransport::builder()
    ///     .max_idle_conns_per_host(4)
    ///     .build()?;
    ///
    /// let client = Client::builder()
    ///     .transport(Arc::new(transport))
    ///     .build()?;
    /// ```
    pub fn transport<U: Transport>(self, transport: U) -> ClientBuilder<U> {
        ClientBuilder {
            defaults: self.defaults,
            base_url: self.base_url,
            interceptors: self.interceptors,
            intercept_responses: self.intercept_responses,
            transport_options: self.transport_options,
            make_transport: Box::new(move |_| Ok(transport)),
        }
    }

    /// Build the client.
    ///
    /// The interceptor chain is frozen here; clients never see later
    /// registrations.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] if the default transport cannot be
    /// created (for example, the TLS configuration is rejected).
    pub fn build(self) -> Result<Client<T>, ClientError> {
        let transport = (self.make_transport)(self.transport_options)?;

        tracing::debug!(
            base_url = ?self.base_url,
            interceptors = self.interceptors.len(),
            intercept_responses = self.intercept_responses,
            "building client"
        );

        Ok(Client::from_parts(
            Arc::new(transport),
            Arc::new(self.interceptors),
            self.defaults,
            self.base_url,
            self.intercept_responses,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeaderInterceptor;
    use crate::error::BoxError;
    use crate::transport::{BoxFuture, ResponseBody};

    struct Refuse;

    impl Transport for Refuse {
        fn send(
            &self,
            _request: http::Request<bytes::Bytes>,
        ) -> BoxFuture<'static, Result<http::Response<ResponseBody>, BoxError>> {
            Box::pin(async { Err("refused".into()) })
        }
    }

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::new();
        assert_eq!(builder.defaults, RequestConfig::new());
        assert!(builder.base_url.is_none());
        assert!(builder.interceptors.is_empty());
        assert!(!builder.intercept_responses);
        assert_eq!(builder.transport_options, TransportOptions::default());
    }

    #[test]
    fn test_builder_timeout_sets_default() {
        let builder = ClientBuilder::new().timeout(Duration::from_secs(5));
        assert_eq!(builder.defaults.get_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_builder_defaults_replace_timeout() {
        let builder = ClientBuilder::new()
            .timeout(Duration::from_secs(5))
            .defaults(RequestConfig::new().header("accept", "application/json"));
        assert!(builder.defaults.get_timeout().is_none());
        assert_eq!(builder.defaults.get_headers()["accept"], "application/json");
    }

    #[test]
    fn test_builder_empty_base_url_is_unset() {
        let builder = ClientBuilder::new().base_url("");
        assert!(builder.base_url.is_none());
    }

    #[test]
    fn test_builder_interceptors_in_order() {
        let builder = ClientBuilder::new()
            .with_interceptor(HeaderInterceptor::new("x-a", "1"))
            .with_interceptor(())
            .with_shared_interceptor(Arc::new(HeaderInterceptor::new("x-b", "2")));
        assert_eq!(builder.interceptors.len(), 3);
    }

    #[test]
    fn test_builder_custom_transport() {
        let client = ClientBuilder::new()
            .intercept_responses(true)
            .with_interceptor(())
            .transport(Refuse)
            .build()
            .unwrap();
        assert_eq!(client.interceptors().len(), 1);
        assert!(client.intercepts_responses());
    }

    #[test]
    fn test_builder_debug() {
        let builder = ClientBuilder::new().with_interceptor(());
        let debug = format!("{:?}", builder);
        assert!(debug.contains("interceptor_count: 1"));
    }
}
