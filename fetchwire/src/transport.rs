//! HTTP transport layer.
//!
//! The client never talks to the network itself. It hands a fully built
//! [`http::Request`] to a [`Transport`] and gets back an [`http::Response`]
//! whose body has not been read yet.
//!
//! [`HyperTransport`] is the default implementation, built on hyper_util's
//! legacy client. It supports:
//!
//! - HTTP/1.1 and HTTP/2 with automatic protocol negotiation
//! - TLS with rustls (`tls` feature, on by default)
//! - Connection pooling tuned through [`TransportOptions`]
//! - Tower service integration for middleware
//!
//! # Example
//!
//! ```ignore
//! use fetchwire::transport::HyperTransport;
//! use std::time::Duration;
//!
//! // Create with default pool settings
//! let transport = HyperTransport::new()?;
//!
//! // Or use the builder for customization
//! let transport = HyperTransport::builder()
//!     .max_idle_conns_per_host(16)
//!     .idle_conn_timeout(Duration::from_secs(30))
//!     .build()?;
//! ```

mod connector;
mod hyper;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;

use crate::error::BoxError;

pub use connector::{ConnectTimeout, Connector, TimeoutConnector, build_connector};
#[cfg(feature = "tls")]
pub use connector::default_tls_config;
pub use hyper::{HyperTransport, HyperTransportBuilder, TransportOptions};

/// Type alias for a boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Body of a response handed back by a transport.
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

/// Something that can execute an HTTP exchange.
///
/// The returned future resolves once response headers are available; the
/// body is read afterwards by the client. Errors are opaque causes from the
/// underlying stack and are reported as
/// [`TransportError::Request`](crate::TransportError::Request).
///
/// Implementations must be safe to call from many tasks at once.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> BoxFuture<'static, Result<http::Response<ResponseBody>, BoxError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> BoxFuture<'static, Result<http::Response<ResponseBody>, BoxError>> {
        (**self).send(request)
    }
}
