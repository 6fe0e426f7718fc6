use super::callback::{CallbackChain, ResponseCallback};
use super::convert::ResponseValue;
use super::deferred::DeferredResponse;
use crate::codec::MediaType;
use crate::transport::HttpResponse;
use bytes::Bytes;
use http::Method;
use std::sync::Arc;
use std::time::Duration;

/// A fully resolved description of one service invocation: concrete URL,
/// HTTP verb, desired response media type, optional encoded payload,
/// retrieval timeout and the callback chain.
///
/// Constructed fresh per invocation and owned by it; after handoff to the
/// transport the only permitted mutation is appending callbacks, and only
/// before dispatch.
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    pub(crate) service: String,
    pub(crate) url: String,
    pub(crate) method: Method,
    pub(crate) accept: MediaType,
    pub(crate) body: Option<Bytes>,
    pub(crate) timeout: Duration,
    pub(crate) callbacks: CallbackChain,
}

impl ServiceRequest {
    /// The configured service this request targets.
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The only acceptable response representation.
    pub fn accept(&self) -> MediaType {
        self.accept
    }

    /// The encoded Protobuf payload, when the invocation carries one.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The wait bound applied to deferred value retrieval. Socket-level
    /// timeouts are the transport's concern.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn callbacks(&self) -> &CallbackChain {
        &self.callbacks
    }

    /// Appends a response observer. The most recently appended observer runs
    /// first once a response is available.
    pub fn add_callback(&mut self, callback: Arc<dyn ResponseCallback>) {
        self.callbacks.append(callback);
    }
}

/// The typed result of an invocation, shaped by the declared
/// [`ResponseShape`](crate::binding::ResponseShape).
#[derive(Debug)]
pub enum InvokeOutcome {
    /// A synchronously converted value.
    Value(ResponseValue),
    /// The untouched HTTP response; the caller owns all further processing.
    Raw(HttpResponse),
    /// A handle to the invocation executing in the background.
    Deferred(DeferredResponse),
}

impl InvokeOutcome {
    /// Returns the inner [`ResponseValue`] if this variant is `Value`.
    pub fn into_value(self) -> Option<ResponseValue> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the decoded message if this is a `Value` holding one.
    pub fn into_message(self) -> Option<prost_reflect::DynamicMessage> {
        self.into_value().and_then(ResponseValue::into_message)
    }

    /// Returns the text body if this is a `Value` holding one.
    pub fn into_text(self) -> Option<String> {
        self.into_value().and_then(ResponseValue::into_text)
    }

    /// Returns the inner [`HttpResponse`] if this variant is `Raw`.
    pub fn into_raw(self) -> Option<HttpResponse> {
        match self {
            Self::Raw(response) => Some(response),
            _ => None,
        }
    }

    /// Returns the inner [`DeferredResponse`] if this variant is `Deferred`.
    pub fn into_deferred(self) -> Option<DeferredResponse> {
        match self {
            Self::Deferred(deferred) => Some(deferred),
            _ => None,
        }
    }
}
