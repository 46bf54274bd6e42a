//! Connector setup for the hyper HTTP client.
//!
//! With the `tls` feature (default) the connector speaks both `http://` and
//! `https://`, using rustls with the ring provider and the system root
//! certificates. Without it only plain HTTP is available.
//!
//! Every connector is wrapped in a [`TimeoutConnector`] that bounds how long
//! establishing a connection (TCP connect plus TLS handshake) may take.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use http::Uri;
use hyper_util::client::legacy::connect::HttpConnector;
use tower_service::Service;

use crate::ClientError;
use crate::error::BoxError;

#[cfg(feature = "tls")]
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
#[cfg(feature = "tls")]
use rustls::ClientConfig;

/// The connector used by [`HyperTransport`](super::HyperTransport).
#[cfg(feature = "tls")]
pub type Connector = HttpsConnector<HttpConnector>;

/// The connector used by [`HyperTransport`](super::HyperTransport).
#[cfg(not(feature = "tls"))]
pub type Connector = HttpConnector;

// ============================================================================
// TLS Configuration
// ============================================================================

/// Build the default TLS configuration: ring crypto provider, safe default
/// protocol versions and the platform's root certificates.
#[cfg(feature = "tls")]
pub fn default_tls_config() -> Result<ClientConfig, ClientError> {
    let provider = std::sync::Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ClientError::Build(format!("configuring TLS: {}", e)))?;

    Ok(builder
        .with_root_certificates(build_root_store())
        .with_no_client_auth())
}

#[cfg(feature = "tls")]
fn build_root_store() -> rustls::RootCertStore {
    let mut roots = rustls::RootCertStore::empty();
    let native_certs = rustls_native_certs::load_native_certs();
    if !native_certs.errors.is_empty() {
        // Some certificates may still have loaded.
        tracing::debug!("errors loading native certs: {:?}", native_certs.errors);
    }
    let (added, ignored) = roots.add_parsable_certificates(native_certs.certs);
    tracing::debug!(added, ignored, "loaded native root certificates");
    roots
}

// ============================================================================
// Connector Builder
// ============================================================================

/// Build the connector for the given connection-establishment deadline.
///
/// `None` disables the deadline.
pub fn build_connector(
    connect_timeout: Option<Duration>,
) -> Result<TimeoutConnector<Connector>, ClientError> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);

    #[cfg(feature = "tls")]
    let connector = HttpsConnectorBuilder::new()
        .with_tls_config(default_tls_config()?)
        .https_or_http()
        .enable_all_versions()
        .wrap_connector(http);

    #[cfg(not(feature = "tls"))]
    let connector = http;

    Ok(TimeoutConnector::new(connector, connect_timeout))
}

// ============================================================================
// Timeout Connector
// ============================================================================

/// Error returned when a connection is not established in time.
#[derive(Debug, thiserror::Error)]
#[error("connection not established within {0:?}")]
pub struct ConnectTimeout(pub Duration);

/// Wraps a connector so that each connection attempt fails with
/// [`ConnectTimeout`] after the configured duration.
#[derive(Clone, Debug)]
pub struct TimeoutConnector<C> {
    inner: C,
    timeout: Option<Duration>,
}

impl<C> TimeoutConnector<C> {
    pub fn new(inner: C, timeout: Option<Duration>) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl<C> Service<Uri> for TimeoutConnector<C>
where
    C: Service<Uri>,
    C::Error: Into<BoxError>,
    C::Future: Send + 'static,
    C::Response: Send + 'static,
{
    type Response = C::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        let connecting = self.inner.call(uri);
        let timeout = self.timeout;
        Box::pin(async move {
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, connecting).await {
                    Ok(result) => result.map_err(Into::into),
                    Err(_) => Err(ConnectTimeout(limit).into()),
                },
                None => connecting.await.map_err(Into::into),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::future::Ready;

    #[derive(Clone)]
    struct Immediate;

    impl Service<Uri> for Immediate {
        type Response = &'static str;
        type Error = Infallible;
        type Future = Ready<Result<&'static str, Infallible>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _uri: Uri) -> Self::Future {
            std::future::ready(Ok("connected"))
        }
    }

    #[derive(Clone)]
    struct Never;

    impl Service<Uri> for Never {
        type Response = &'static str;
        type Error = Infallible;
        type Future = std::future::Pending<Result<&'static str, Infallible>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _uri: Uri) -> Self::Future {
            std::future::pending()
        }
    }

    #[tokio::test]
    async fn test_timeout_connector_passes_through() {
        let mut connector = TimeoutConnector::new(Immediate, Some(Duration::from_secs(1)));
        let conn = connector.call(Uri::from_static("http://localhost")).await.unwrap();
        assert_eq!(conn, "connected");
    }

    #[tokio::test]
    async fn test_timeout_connector_times_out() {
        let mut connector = TimeoutConnector::new(Never, Some(Duration::from_millis(20)));
        let err = connector
            .call(Uri::from_static("http://localhost"))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ConnectTimeout>().is_some());
    }

    #[test]
    fn test_build_connector() {
        let connector = build_connector(Some(Duration::from_secs(10))).unwrap();
        assert_eq!(connector.timeout(), Some(Duration::from_secs(10)));
    }
}
