//! # Media Types & Message Codec
//!
//! This module bridges [`DynamicMessage`] values and HTTP bodies.
//!
//! Requests always carry Protobuf binary bodies. Responses are decoded
//! according to the media type declared on the method binding: Protobuf bytes
//! or JSON (transcoded through `prost-reflect`'s serde support). Extension
//! fields present in a body are resolved through the descriptor pool the
//! message descriptor came from.
use crate::client::convert::ConversionError;
use bytes::Bytes;
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use std::fmt;
use std::str::FromStr;

/// The media types a service operation can declare for its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// `application/x-protobuf`, the default.
    Protobuf,
    /// `application/json`.
    Json,
    /// `text/plain`.
    Text,
}

impl MediaType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Protobuf => "application/x-protobuf",
            Self::Json => "application/json",
            Self::Text => "text/plain",
        }
    }

    /// Whether the media type carries binary content unfit for a text value.
    pub const fn is_binary(&self) -> bool {
        matches!(self, Self::Protobuf)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown media type '{0}'")]
pub struct UnknownMediaType(String);

impl FromStr for MediaType {
    type Err = UnknownMediaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "application/x-protobuf" | "protobuf" => Ok(Self::Protobuf),
            "application/json" | "json" => Ok(Self::Json),
            "text/plain" | "text" => Ok(Self::Text),
            other => Err(UnknownMediaType(other.to_string())),
        }
    }
}

/// Encodes a message into its Protobuf binary form.
pub fn encode(message: &DynamicMessage) -> Bytes {
    message.encode_to_vec().into()
}

/// Decodes a response body into a message of the given type.
///
/// Extension fields are resolved through the pool the descriptor belongs to.
pub fn decode(
    descriptor: MessageDescriptor,
    media: MediaType,
    body: &[u8],
) -> Result<DynamicMessage, ConversionError> {
    match media {
        MediaType::Protobuf => DynamicMessage::decode(descriptor.clone(), body).map_err(|e| {
            ConversionError::Decode {
                message_type: descriptor.full_name().to_string(),
                reason: e.to_string(),
            }
        }),
        MediaType::Json => {
            let mut de = serde_json::Deserializer::from_slice(body);
            DynamicMessage::deserialize(descriptor.clone(), &mut de).map_err(|e| {
                ConversionError::Decode {
                    message_type: descriptor.full_name().to_string(),
                    reason: e.to_string(),
                }
            })
        }
        MediaType::Text => Err(ConversionError::UnsupportedMedia(MediaType::Text)),
    }
}
