//! Request configuration for the fetchwire client.
//!
//! This module contains request-level configuration:
//! - [`RequestConfig`]: Method, URL, headers, query parameters, body and timeout
//! - [`Intercept`]: Request/response interception

mod interceptor;
mod options;

pub use interceptor::{HeaderInterceptor, HttpRequest, Intercept, Interceptor, InterceptorChain};
pub use options::{RequestConfig, merge};
