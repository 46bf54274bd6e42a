//! Request configuration and the merge algorithm.
//!
//! A [`RequestConfig`] is used twice: once as the client-level default set on
//! the [`ClientBuilder`](crate::ClientBuilder), and once per call. The two are
//! combined with [`RequestConfig::merge`] into the *effective* configuration
//! of a single request.
//!
//! Every scalar field is optional. `None` means "not set here, inherit", so a
//! per-call `timeout(Duration::ZERO)` is an explicit "no deadline" and is not
//! confused with an absent value.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;

use crate::ClientError;

/// Configuration for a request, or the defaults a client applies to every
/// request.
///
/// # Example
///
/// ```ignore
/// use fetchwire::RequestConfig;
/// use std::time::Duration;
///
/// let config = RequestConfig::post("https://api.example.com/posts")
///     .header("authorization", "Bearer token123")
///     .param("draft", "true")
///     .body(r#"{"title":"hello"}"#)
///     .timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    pub(crate) method: Option<Method>,
    pub(crate) url: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) params: BTreeMap<String, String>,
    pub(crate) body: Option<Bytes>,
    pub(crate) timeout: Option<Duration>,
}

impl RequestConfig {
    /// Create an empty configuration; every field inherits on merge.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new().method(Method::GET).url(url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new().method(Method::POST).url(url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new().method(Method::PUT).url(url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new().method(Method::PATCH).url(url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new().method(Method::DELETE).url(url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new().method(Method::HEAD).url(url)
    }

    /// Set the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the request URL.
    ///
    /// Absolute URLs are used as-is. Relative URLs are joined onto the
    /// client's base URL. An empty string leaves the URL unset.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.url = (!url.is_empty()).then_some(url);
        self
    }

    /// Append a header value.
    ///
    /// Several calls with the same name accumulate values. On merge, the
    /// whole value list of a name replaces the other side's list.
    ///
    /// # Panics
    ///
    /// Panics if the header name or value is invalid.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        K::Error: std::fmt::Debug,
        V: TryInto<HeaderValue>,
        V::Error: std::fmt::Debug,
    {
        let name = name.try_into().expect("invalid header name");
        let value = value.try_into().expect("invalid header value");
        self.headers.append(name, value);
        self
    }

    /// Try to append a header value.
    ///
    /// Returns `None` if the header name or value is invalid.
    pub fn try_header<K, V>(mut self, name: K, value: V) -> Option<Self>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        let name = name.try_into().ok()?;
        let value = value.try_into().ok()?;
        self.headers.append(name, value);
        Some(self)
    }

    /// Set all headers, replacing any existing ones.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set a query parameter. Setting the same key twice keeps the last value.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the raw request body. The bytes are sent unchanged.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set `content-type:
    /// application/json`.
    pub fn json_body<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, ClientError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| ClientError::Build(format!("encoding JSON body: {}", e)))?;
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = Some(Bytes::from(body));
        Ok(self)
    }

    /// Set the timeout. `Duration::ZERO` explicitly disables the deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn get_method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn get_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn get_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a mutable reference to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn get_params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn get_body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The deadline to enforce, if any. Unset and zero both mean no deadline.
    pub(crate) fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|t| !t.is_zero())
    }

    /// Merge `overrides` on top of `self`, producing a fresh configuration.
    ///
    /// - method, url, body, timeout: the override wins when it is set.
    /// - headers: for every name present in the override, its value list
    ///   replaces the base list for that (case-insensitive) name.
    /// - params: the override wins per key.
    ///
    /// Neither input is modified and the result shares no mutable state with
    /// them.
    pub fn merge(&self, overrides: &RequestConfig) -> RequestConfig {
        RequestConfig {
            method: overrides.method.clone().or_else(|| self.method.clone()),
            url: overrides.url.clone().or_else(|| self.url.clone()),
            headers: merge_headers(&self.headers, &overrides.headers),
            params: merge_params(&self.params, &overrides.params),
            body: overrides.body.clone().or_else(|| self.body.clone()),
            timeout: overrides.timeout.or(self.timeout),
        }
    }

    /// Resolve the final URL: join onto `base_url` when relative and append
    /// the encoded query parameters.
    pub(crate) fn target_url(&self, base_url: Option<&str>) -> Result<String, ClientError> {
        let mut url = match (self.url.as_deref(), base_url) {
            (Some(url), _) if url.contains("://") => url.to_string(),
            (Some(url), Some(base)) => join_url(base, url),
            (Some(url), None) => url.to_string(),
            (None, Some(base)) => base.to_string(),
            (None, None) => return Err(ClientError::Build("no URL configured".into())),
        };

        if !self.params.is_empty() {
            let query = serde_qs::to_string(&self.params)
                .map_err(|e| ClientError::Build(format!("encoding query parameters: {}", e)))?;
            match url.rfind('?') {
                None => url.push('?'),
                Some(idx) if idx + 1 == url.len() || url.ends_with('&') => {}
                Some(_) => url.push('&'),
            }
            url.push_str(&query);
        }

        Ok(url)
    }
}

/// Free-function form of [`RequestConfig::merge`].
pub fn merge(base: &RequestConfig, overrides: &RequestConfig) -> RequestConfig {
    base.merge(overrides)
}

fn merge_headers(base: &HeaderMap, overrides: &HeaderMap) -> HeaderMap {
    let mut merged = base.clone();
    for name in overrides.keys() {
        merged.remove(name);
        for value in overrides.get_all(name) {
            merged.append(name.clone(), value.clone());
        }
    }
    merged
}

fn merge_params(
    base: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = base.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
