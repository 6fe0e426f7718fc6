//! # Reqwest Transport
//!
//! Default [`Transport`] implementation backed by a shared
//! [`reqwest::Client`].
//!
//! The `Accept` header is set from the operation's desired media type; when
//! the request carries a payload it is sent as `application/x-protobuf`.
use super::{HttpResponse, Transport, TransportError};
use crate::client::ServiceRequest;
use crate::codec::MediaType;
use http::header::{ACCEPT, CONTENT_TYPE};

/// A [`Transport`] delegating to [`reqwest::Client`].
///
/// Cloning shares the underlying connection pool.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: &ServiceRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url())
            .timeout(request.timeout())
            .header(ACCEPT, request.accept().as_str());

        if let Some(body) = request.body() {
            builder = builder
                .header(CONTENT_TYPE, MediaType::Protobuf.as_str())
                .body(body.clone());
        }

        let response =
            builder
                .send()
                .await
                .map_err(|source| TransportError::RequestFailed {
                    method: request.method().clone(),
                    url: request.url().to_string(),
                    source: source.into(),
                })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|source| TransportError::BodyRead {
                url: request.url().to_string(),
                source: source.into(),
            })?;

        Ok(HttpResponse::new(status, headers, body))
    }
}
