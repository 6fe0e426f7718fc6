//! # HTTP Transport
//!
//! The seam between the invocation core and an actual HTTP client.
//!
//! The dispatcher hands a fully resolved [`ServiceRequest`] to a
//! [`Transport`] and gets back a buffered [`HttpResponse`]. The transport
//! owns connection pooling, socket timeouts and retries; the core adds none
//! of these and propagates transport failures unmodified.
//!
//! [`reqwest::ReqwestTransport`] is the default implementation.
pub mod reqwest;

use crate::BoxError;
use crate::client::ServiceRequest;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use std::future::Future;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to send {method} request to '{url}': '{source}'")]
    RequestFailed {
        method: Method,
        url: String,
        source: BoxError,
    },
    #[error("Failed to read the response body from '{url}': '{source}'")]
    BodyRead { url: String, source: BoxError },
}

/// A buffered HTTP response.
///
/// Exposes the status line, header lookup by name and the complete body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The canonical reason phrase for the status code, or an empty string
    /// for unregistered codes.
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Looks up a header by name, returning it as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

/// Executes resolved service requests over HTTP.
///
/// Implementors are cheap to clone (typically a handle to a shared
/// connection pool); the deferred invocation path moves a clone into a
/// background task.
pub trait Transport: Clone + Send + Sync + 'static {
    /// Executes the request and buffers the full response.
    fn execute(
        &self,
        request: &ServiceRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}
