//! # Response Converter
//!
//! Maps a raw HTTP response to the declared value of an operation: nothing,
//! the full body as text, or a decoded structured message. An empty body for
//! a message target yields the type's canonical default instance.
use crate::codec::{self, MediaType};
use crate::transport::HttpResponse;
use prost_reflect::{DynamicMessage, MessageDescriptor};

/// Fatal conversion failures: the body can not be represented as the
/// declared value. Never silently swallowed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    #[error("Response body is not valid UTF-8 text: '{0}'")]
    NotText(#[from] std::string::FromUtf8Error),
    #[error("Failed to decode response body as '{message_type}': '{reason}'")]
    Decode { message_type: String, reason: String },
    #[error("Media type '{0}' can not carry a structured message")]
    UnsupportedMedia(MediaType),
}

/// Raised when the response status is in the client/server error range.
///
/// Carries the status line and the response `Server` header for diagnostics.
/// Surfaced after the callback chain has run and before any conversion.
#[derive(Debug, Clone, thiserror::Error)]
#[error(
    "Failed service invocation. statusCode: {status}, statusMessage: '{status_text}', server: {server:?}"
)]
pub struct InvocationFailed {
    pub status: u16,
    pub status_text: String,
    pub server: Option<String>,
}

/// The resolved value a response body converts into.
#[derive(Debug, Clone)]
pub(crate) enum ResponseTarget {
    Unit,
    Text,
    Message(MessageDescriptor),
}

/// The converted value of a completed invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue {
    Empty,
    Text(String),
    Message(DynamicMessage),
}

impl ResponseValue {
    pub fn into_message(self) -> Option<DynamicMessage> {
        match self {
            Self::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

pub(crate) fn convert(
    target: &ResponseTarget,
    media: MediaType,
    response: &HttpResponse,
) -> Result<ResponseValue, ConversionError> {
    match target {
        ResponseTarget::Unit => Ok(ResponseValue::Empty),
        ResponseTarget::Text => Ok(ResponseValue::Text(String::from_utf8(
            response.body().to_vec(),
        )?)),
        ResponseTarget::Message(descriptor) => {
            if response.body().is_empty() {
                // Zero bytes available: the canonical empty instance.
                Ok(ResponseValue::Message(DynamicMessage::new(
                    descriptor.clone(),
                )))
            } else {
                codec::decode(descriptor.clone(), media, response.body())
                    .map(ResponseValue::Message)
            }
        }
    }
}

pub(crate) fn ensure_success(response: &HttpResponse) -> Result<(), InvocationFailed> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(InvocationFailed {
            status: status.as_u16(),
            status_text: response.status_text().to_string(),
            server: response.header("server").map(str::to_string),
        });
    }
    Ok(())
}
