//! # Method Bindings
//!
//! This module defines the declarative table a caller registers once at
//! startup: one [`MethodBinding`] per logical service operation, holding the
//! URL pattern, the per-position parameter bindings, the HTTP verb (explicit
//! or inferred from the method name) and the declared response shape.
//!
//! Runtime values are passed positionally as [`Arg`]s, parallel to the
//! binding's parameter list.
use crate::client::callback::ResponseCallback;
use crate::codec::MediaType;
use crate::config::DEFAULT_TIMEOUT;
use http::Method;
use prost_reflect::DynamicMessage;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Fatal configuration errors, always raised before any network call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Base URL for the service '{0}' is not present in the configuration")]
    MissingBaseUrl(String),
    #[error("'{0}' is a required parameter")]
    MissingRequiredParam(String),
    #[error("An array can not be used as an argument for '${{{0}}}' as part of the URL path")]
    ArrayInPath(String),
    #[error("Message type '{0}' is not registered in the descriptor pool")]
    UnknownMessageType(String),
    #[error("Only text media types can be used when the declared value is text, not '{0}'")]
    TextWithBinaryMedia(MediaType),
}

/// Infers the HTTP verb from a method name by prefix convention:
///
/// * `get*` → GET
/// * `delete*` → DELETE
/// * `set*` | `update*` → PUT
/// * `create*` and everything else → POST
///
/// An explicit verb on the [`MethodBinding`] always overrides inference.
pub fn infer_verb(name: &str) -> Method {
    if name.starts_with("get") {
        Method::GET
    } else if name.starts_with("delete") {
        Method::DELETE
    } else if name.starts_with("set") || name.starts_with("update") {
        Method::PUT
    } else {
        Method::POST
    }
}

/// Per-position parameter metadata.
#[derive(Debug, Clone)]
pub enum ParamBinding {
    /// A named parameter, substituted into the URL pattern when a
    /// `${name}` placeholder exists, appended to the query string otherwise.
    Named { name: String, required: bool },
    /// Explicit request body marker. The argument at this position must be a
    /// structured message.
    Body,
}

impl ParamBinding {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            required: false,
        }
    }

    pub fn required(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            required: true,
        }
    }
}

/// The value a response body converts into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueShape {
    /// The body is discarded.
    Unit,
    /// The full body, decoded as text.
    Text,
    /// A structured message, identified by its fully qualified name
    /// (e.g. `tester.Tester`). The name must resolve in the client's
    /// descriptor pool; an unknown name is a fatal configuration error
    /// raised at first use.
    Message(String),
}

/// The declared result of an operation.
///
/// Synchronous and deferred expectations can not be mixed: a shape is either
/// a direct value, a deferred value, or the raw response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    /// Convert the response synchronously into a [`ValueShape`].
    Value(ValueShape),
    /// Return a deferred handle immediately; conversion into the
    /// [`ValueShape`] happens lazily on retrieval.
    Deferred(ValueShape),
    /// Return the untouched HTTP response. The caller owns all further
    /// processing, including status validation.
    Raw,
}

impl ResponseShape {
    pub fn unit() -> Self {
        Self::Value(ValueShape::Unit)
    }

    pub fn text() -> Self {
        Self::Value(ValueShape::Text)
    }

    pub fn message(full_name: impl Into<String>) -> Self {
        Self::Value(ValueShape::Message(full_name.into()))
    }

    pub fn deferred_message(full_name: impl Into<String>) -> Self {
        Self::Deferred(ValueShape::Message(full_name.into()))
    }
}

/// One registered service operation.
#[derive(Debug, Clone)]
pub struct MethodBinding {
    service: String,
    name: String,
    pattern: String,
    verb: Option<Method>,
    accept: MediaType,
    params: Vec<Option<ParamBinding>>,
    shape: ResponseShape,
}

impl MethodBinding {
    /// Creates a binding for the operation `name` against the configured
    /// service `service`, with an empty URL pattern, no explicit verb
    /// (inference applies), Protobuf as the desired response media type and
    /// no parameters.
    pub fn new(service: impl Into<String>, name: impl Into<String>, shape: ResponseShape) -> Self {
        Self {
            service: service.into(),
            name: name.into(),
            pattern: String::new(),
            verb: None,
            accept: MediaType::Protobuf,
            params: Vec::new(),
            shape,
        }
    }

    /// Sets the URL pattern, possibly containing `${name}` placeholders.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Sets an explicit HTTP verb, overriding name-based inference.
    pub fn with_verb(mut self, verb: Method) -> Self {
        self.verb = Some(verb);
        self
    }

    /// Sets the desired response media type.
    pub fn with_accept(mut self, accept: MediaType) -> Self {
        self.accept = accept;
        self
    }

    /// Appends an optional named parameter position.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Some(ParamBinding::named(name)));
        self
    }

    /// Appends a required named parameter position.
    pub fn required_param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Some(ParamBinding::required(name)));
        self
    }

    /// Appends an explicit request body position.
    pub fn body_param(mut self) -> Self {
        self.params.push(Some(ParamBinding::Body));
        self
    }

    /// Appends a position without a binding — either the sole
    /// structured-message payload or an argument that is ignored with a
    /// warning.
    pub fn unbound_param(mut self) -> Self {
        self.params.push(None);
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn accept(&self) -> MediaType {
        self.accept
    }

    pub fn params(&self) -> &[Option<ParamBinding>] {
        &self.params
    }

    pub fn shape(&self) -> &ResponseShape {
        &self.shape
    }

    /// The effective HTTP verb: the explicit declaration when present,
    /// otherwise the verb inferred from the method name.
    pub fn verb(&self) -> Method {
        self.verb.clone().unwrap_or_else(|| infer_verb(&self.name))
    }
}

/// A runtime argument value, positionally parallel to the binding's
/// parameter list.
#[derive(Clone)]
pub enum Arg {
    /// A single value in its string form; `None` is the absence value.
    Scalar(Option<String>),
    /// An array value. In the query string it expands to repeated
    /// `name=value` pairs, skipping `None` elements; in a path segment it is
    /// rejected.
    Repeated(Vec<Option<String>>),
    /// A structured-message payload candidate.
    Message(DynamicMessage),
    /// A response observer, invoked once a response is available. Never part
    /// of the URL.
    Callback(Arc<dyn ResponseCallback>),
}

impl Arg {
    /// The absence value.
    pub fn absent() -> Self {
        Self::Scalar(None)
    }

    pub fn scalar(value: impl ToString) -> Self {
        Self::Scalar(Some(value.to_string()))
    }

    pub fn repeated<T: ToString>(items: impl IntoIterator<Item = Option<T>>) -> Self {
        Self::Repeated(
            items
                .into_iter()
                .map(|item| item.map(|v| v.to_string()))
                .collect(),
        )
    }

    pub fn message(message: DynamicMessage) -> Self {
        Self::Message(message)
    }

    pub fn callback(callback: Arc<dyn ResponseCallback>) -> Self {
        Self::Callback(callback)
    }

    pub(crate) fn is_absent(&self) -> bool {
        matches!(self, Self::Scalar(None))
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            Self::Repeated(v) => f.debug_tuple("Repeated").field(v).finish(),
            Self::Message(m) => f.debug_tuple("Message").field(m).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::scalar(value)
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Scalar(Some(value))
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Self::scalar(value)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Self::scalar(value)
    }
}

impl From<u64> for Arg {
    fn from(value: u64) -> Self {
        Self::scalar(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::scalar(value)
    }
}

impl From<DynamicMessage> for Arg {
    fn from(value: DynamicMessage) -> Self {
        Self::Message(value)
    }
}

/// The explicit method table, populated once at startup.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    bindings: HashMap<String, Arc<MethodBinding>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a binding under its method name, replacing any previous
    /// binding with the same name.
    pub fn register(&mut self, binding: MethodBinding) {
        self.bindings
            .insert(binding.name().to_string(), Arc::new(binding));
    }

    pub fn get(&self, name: &str) -> Option<Arc<MethodBinding>> {
        self.bindings.get(name).cloned()
    }
}

/// Per-service invocation settings resolved from the configuration, cached
/// by the client after the first lookup.
#[derive(Debug, Clone)]
pub struct ServiceBinding {
    base_url: String,
    timeout: Duration,
}

impl ServiceBinding {
    pub(crate) fn new(base_url: String, timeout_seconds: Option<u64>) -> Self {
        Self {
            base_url,
            timeout: timeout_seconds.map_or(DEFAULT_TIMEOUT, Duration::from_secs),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
