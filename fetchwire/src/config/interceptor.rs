//! Interceptors for outgoing requests and received responses.
//!
//! Interceptors add cross-cutting logic around a request, such as:
//! - Adding authentication headers
//! - Rewriting or inspecting response bodies
//! - Rejecting requests before they reach the network
//!
//! # Example
//!
//! ```ignore
//! use fetchwire::{Client, HeaderInterceptor, Interceptor};
//!
//! // Simple header interceptor
//! let auth = HeaderInterceptor::new("authorization", "Bearer token123");
//!
//! // Closure interceptor with both halves
//! let audit = Interceptor::new()
//!     .on_request(|req| {
//!         println!("-> {} {}", req.method(), req.uri());
//!         Ok(req)
//!     })
//!     .on_response(|resp| {
//!         println!("<- {}", resp.status());
//!         Ok(resp)
//!     });
//!
//! let client = Client::builder()
//!     .with_interceptor(auth)
//!     .with_interceptor(audit)
//!     .build()?;
//! ```

use std::sync::Arc;

use bytes::Bytes;

use crate::error::{BoxError, InterceptorError, Stage};
use crate::{ClientError, Response};

/// The request value interceptors operate on.
pub type HttpRequest = http::Request<Bytes>;

// ============================================================================
// Intercept Trait
// ============================================================================

/// Trait for intercepting requests and responses.
///
/// Both methods default to passing the value through unchanged, so an
/// implementation only overrides the half it cares about. Returning an error
/// stops the pipeline at this interceptor.
pub trait Intercept: Send + Sync {
    /// Called before the request is sent.
    fn intercept_request(&self, request: HttpRequest) -> Result<HttpRequest, BoxError> {
        Ok(request)
    }

    /// Called on a received response.
    fn intercept_response(&self, response: Response) -> Result<Response, BoxError> {
        Ok(response)
    }
}

/// The unit type is a no-op interceptor.
impl Intercept for () {}

impl<T: Intercept + ?Sized> Intercept for Arc<T> {
    fn intercept_request(&self, request: HttpRequest) -> Result<HttpRequest, BoxError> {
        (**self).intercept_request(request)
    }

    fn intercept_response(&self, response: Response) -> Result<Response, BoxError> {
        (**self).intercept_response(response)
    }
}

// ============================================================================
// Interceptor Chain
// ============================================================================

/// An ordered, append-only list of interceptors.
///
/// Registration order is the application order for both stages. A chain is
/// mutable while owned by a [`ClientBuilder`](crate::ClientBuilder); once the
/// client is built it is shared read-only between concurrent requests.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Intercept>>,
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("count", &self.interceptors.len())
            .finish()
    }
}

impl InterceptorChain {
    /// Create a new empty interceptor chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor to the chain.
    pub fn register<I: Intercept + 'static>(&mut self, interceptor: I) {
        self.interceptors.push(Arc::new(interceptor));
    }

    /// Append an already shared interceptor to the chain.
    pub fn push(&mut self, interceptor: Arc<dyn Intercept>) {
        self.interceptors.push(interceptor);
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Run every interceptor's request half, in registration order.
    ///
    /// The first failure stops the fold; interceptors after it are never
    /// invoked. Changes made by earlier interceptors are not undone, but the
    /// request is not returned either.
    pub fn apply_request(&self, request: HttpRequest) -> Result<HttpRequest, InterceptorError> {
        self.interceptors
            .iter()
            .enumerate()
            .try_fold(request, |request, (index, interceptor)| {
                tracing::trace!(index, stage = %Stage::Request, "applying interceptor");
                interceptor
                    .intercept_request(request)
                    .map_err(|source| InterceptorError::new(Stage::Request, index, source))
            })
    }

    /// Run every interceptor's response half, in registration order.
    ///
    /// Same short-circuit rules as [`apply_request`](Self::apply_request).
    pub fn apply_response(&self, response: Response) -> Result<Response, InterceptorError> {
        self.interceptors
            .iter()
            .enumerate()
            .try_fold(response, |response, (index, interceptor)| {
                tracing::trace!(index, stage = %Stage::Response, "applying interceptor");
                interceptor
                    .intercept_response(response)
                    .map_err(|source| InterceptorError::new(Stage::Response, index, source))
            })
    }
}

// ============================================================================
// Header Interceptor
// ============================================================================

/// An interceptor that sets one header on every outgoing request, replacing
/// any value already present under that name.
///
/// # Example
///
/// ```ignore
/// use fetchwire::{Client, HeaderInterceptor};
///
/// let client = Client::builder()
///     .with_interceptor(HeaderInterceptor::new("authorization", "Bearer token123"))
///     .build()?;
/// ```
#[derive(Clone, Debug)]
pub struct HeaderInterceptor {
    name: http::HeaderName,
    value: http::HeaderValue,
}

impl HeaderInterceptor {
    /// Create a new header interceptor.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid.
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.parse().expect("invalid header name"),
            value: value.parse().expect("invalid header value"),
        }
    }

    /// Try to create a new header interceptor, returning an error if invalid.
    pub fn try_new(name: &str, value: &str) -> Result<Self, ClientError> {
        let name = name
            .parse()
            .map_err(|_| ClientError::Build(format!("invalid header name: {}", name)))?;
        let value = value
            .parse()
            .map_err(|_| ClientError::Build(format!("invalid header value: {}", value)))?;
        Ok(Self { name, value })
    }

    /// Create a new header interceptor from pre-parsed values.
    pub fn from_parts(name: http::HeaderName, value: http::HeaderValue) -> Self {
        Self { name, value }
    }
}

impl Intercept for HeaderInterceptor {
    fn intercept_request(&self, mut request: HttpRequest) -> Result<HttpRequest, BoxError> {
        request
            .headers_mut()
            .insert(self.name.clone(), self.value.clone());
        Ok(request)
    }
}

// ============================================================================
// Closure Interceptor
// ============================================================================

type RequestFn = Arc<dyn Fn(HttpRequest) -> Result<HttpRequest, BoxError> + Send + Sync>;
type ResponseFn = Arc<dyn Fn(Response) -> Result<Response, BoxError> + Send + Sync>;

/// A pair of optional closures adapted to the [`Intercept`] trait.
///
/// A missing half passes its value through unchanged.
///
/// # Example
///
/// ```ignore
/// use fetchwire::Interceptor;
///
/// let reject_plain_http = Interceptor::request(|req| {
///     if req.uri().scheme_str() == Some("http") {
///         return Err("plain http is not allowed".into());
///     }
///     Ok(req)
/// });
/// ```
#[derive(Clone, Default)]
pub struct Interceptor {
    request: Option<RequestFn>,
    response: Option<ResponseFn>,
}

impl Interceptor {
    /// Create an interceptor with neither half set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an interceptor with only a request half.
    pub fn request<F>(f: F) -> Self
    where
        F: Fn(HttpRequest) -> Result<HttpRequest, BoxError> + Send + Sync + 'static,
    {
        Self::new().on_request(f)
    }

    /// Create an interceptor with only a response half.
    pub fn response<F>(f: F) -> Self
    where
        F: Fn(Response) -> Result<Response, BoxError> + Send + Sync + 'static,
    {
        Self::new().on_response(f)
    }

    /// Set the request half.
    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: Fn(HttpRequest) -> Result<HttpRequest, BoxError> + Send + Sync + 'static,
    {
        self.request = Some(Arc::new(f));
        self
    }

    /// Set the response half.
    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(Response) -> Result<Response, BoxError> + Send + Sync + 'static,
    {
        self.response = Some(Arc::new(f));
        self
    }
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("request", &self.request.is_some())
            .field("response", &self.response.is_some())
            .finish()
    }
}

impl Intercept for Interceptor {
    fn intercept_request(&self, request: HttpRequest) -> Result<HttpRequest, BoxError> {
        match &self.request {
            Some(f) => f(request),
            None => Ok(request),
        }
    }

    fn intercept_response(&self, response: Response) -> Result<Response, BoxError> {
        match &self.response {
            Some(f) => f(response),
            None => Ok(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::{HeaderMap, StatusCode};

    fn request() -> HttpRequest {
        http::Request::builder()
            .uri("http://localhost/test")
            .body(Bytes::new())
            .unwrap()
    }

    fn response(body: &'static str) -> Response {
        Response::new(StatusCode::OK, HeaderMap::new(), Bytes::from_static(body.as_bytes()))
    }

    fn marker(name: &'static str) -> Interceptor {
        Interceptor::request(move |mut req| {
            req.headers_mut().append("x-marker", name.parse().unwrap());
            Ok(req)
        })
    }

    #[test]
    fn test_header_interceptor() {
        let interceptor = HeaderInterceptor::new("x-custom-header", "test-value");
        let req = interceptor.intercept_request(request()).unwrap();
        assert_eq!(req.headers().get("x-custom-header").unwrap(), "test-value");
    }

    #[test]
    fn test_header_interceptor_try_new_invalid() {
        let err = HeaderInterceptor::try_new("bad\0name", "v").unwrap_err();
        assert!(matches!(err, ClientError::Build(_)));
    }

    #[test]
    fn test_unit_interceptor_noop() {
        let req = ().intercept_request(request()).unwrap();
        assert!(req.headers().is_empty());
    }

    #[test]
    fn test_interceptor_chain_empty() {
        let chain = InterceptorChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
        let req = chain.apply_request(request()).unwrap();
        assert_eq!(req.uri(), "http://localhost/test");
    }

    #[test]
    fn test_interceptor_chain_order() {
        let mut chain = InterceptorChain::new();
        chain.register(marker("t1"));
        chain.register(marker("t2"));
        assert_eq!(chain.len(), 2);

        let req = chain.apply_request(request()).unwrap();
        let markers: Vec<_> = req
            .headers()
            .get_all("x-marker")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(markers, vec!["t1", "t2"]);
    }

    #[test]
    fn test_missing_half_is_noop() {
        let mut chain = InterceptorChain::new();
        chain.register(Interceptor::response(|resp| Ok(resp)));
        chain.register(marker("only"));

        let req = chain.apply_request(request()).unwrap();
        assert_eq!(req.headers().get("x-marker").unwrap(), "only");

        let resp = chain.apply_response(response("body")).unwrap();
        assert_eq!(resp.body().as_ref(), b"body");
    }

    #[test]
    fn test_request_stage_short_circuits() {
        let second_calls = Arc::new(AtomicUsize::new(0));
        let counter = second_calls.clone();

        let mut chain = InterceptorChain::new();
        chain.register(Interceptor::request(|_| Err("denied".into())));
        chain.register(Interceptor::request(move |req| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(req)
        }));

        let err = chain.apply_request(request()).unwrap_err();
        assert_eq!(err.stage, Stage::Request);
        assert_eq!(err.index, 0);
        assert_eq!(err.source.to_string(), "denied");
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failure_index_is_position_in_chain() {
        let mut chain = InterceptorChain::new();
        chain.register(marker("ok"));
        chain.register(());
        chain.register(Interceptor::request(|_| Err("third fails".into())));

        let err = chain.apply_request(request()).unwrap_err();
        assert_eq!(err.index, 2);
    }

    #[test]
    fn test_response_stage_replaces_body_in_order() {
        let mut chain = InterceptorChain::new();
        chain.register(Interceptor::response(|mut resp| {
            resp.set_body(Bytes::from_static(b"first"));
            Ok(resp)
        }));
        chain.register(Interceptor::response(|mut resp| {
            let body = format!("{}+second", resp.text());
            resp.set_body(body);
            Ok(resp)
        }));

        let resp = chain.apply_response(response("original")).unwrap();
        assert_eq!(resp.text(), "first+second");
    }

    #[test]
    fn test_response_stage_short_circuits() {
        let mut chain = InterceptorChain::new();
        chain.register(Interceptor::response(|resp| Ok(resp)));
        chain.register(Interceptor::response(|_| Err("bad payload".into())));
        chain.register(Interceptor::response(|_| panic!("must not run")));

        let err = chain.apply_response(response("x")).unwrap_err();
        assert_eq!(err.stage, Stage::Response);
        assert_eq!(err.index, 1);
    }

    #[test]
    fn test_shared_interceptor_via_arc() {
        let shared: Arc<dyn Intercept> = Arc::new(HeaderInterceptor::new("x-shared", "1"));
        let mut chain = InterceptorChain::new();
        chain.push(shared.clone());
        chain.push(shared);

        let req = chain.apply_request(request()).unwrap();
        assert_eq!(req.headers().get_all("x-shared").iter().count(), 1);
    }
}
