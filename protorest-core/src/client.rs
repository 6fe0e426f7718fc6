//! # Invocation Dispatcher
//!
//! This module implements the high-level logic for executing declarative
//! service invocations.
//!
//! Given a registered [`MethodBinding`] and the runtime [`Arg`]s, the
//! [`RestClient`]:
//!
//! 1. Resolves the service configuration (base URL, timeout), caching the
//!    result per service.
//! 2. Builds a [`ServiceRequest`]: verb (explicit or inferred), concrete URL
//!    (pattern substitution plus query assembly), optional encoded payload
//!    and the callback chain. All configuration errors surface here, before
//!    any network I/O.
//! 3. Branches on the declared [`ResponseShape`]: raw responses are returned
//!    untouched, deferred operations are spawned in the background and a
//!    [`DeferredResponse`] handle is returned immediately, and direct values
//!    are executed synchronously and converted in place.
pub mod callback;
pub mod convert;
pub mod deferred;
mod types;
pub(crate) mod url;

pub use deferred::DeferredResponse;
pub use types::*;

use crate::binding::{
    Arg, ConfigurationError, MethodBinding, MethodRegistry, ParamBinding, ResponseShape,
    ServiceBinding, ValueShape,
};
use crate::codec::{self, MediaType};
use crate::config::ServiceConfigurator;
use crate::transport::{Transport, TransportError};
use callback::CallbackChain;
use convert::{ConversionError, InvocationFailed, ResponseTarget};
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Errors that can occur during a synchronous invocation.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("Method '{0}' is not registered")]
    UnknownMethod(String),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Failed(#[from] InvocationFailed),
    #[error("Transport error: '{0}'")]
    Transport(#[from] TransportError),
}

/// The main client for invoking declaratively bound HTTP service operations.
///
/// Construction wires together the three external collaborators: the
/// [`Transport`] performing the network I/O, the [`ServiceConfigurator`]
/// resolving service names to base URLs and timeouts, and the
/// [`DescriptorPool`] acting as message schema source and extension registry.
///
/// Resolved service bindings and message descriptors are cached process-wide;
/// the caches are write-once per key and safe under concurrent first-use
/// racing, since every writer computes the same value.
pub struct RestClient<T> {
    transport: T,
    config: Arc<dyn ServiceConfigurator>,
    pool: DescriptorPool,
    registry: MethodRegistry,
    services: RwLock<HashMap<String, Arc<ServiceBinding>>>,
    descriptors: RwLock<HashMap<String, MessageDescriptor>>,
}

impl<T: Transport> RestClient<T> {
    pub fn new(
        transport: T,
        config: impl ServiceConfigurator + 'static,
        pool: DescriptorPool,
    ) -> Self {
        Self {
            transport,
            config: Arc::new(config),
            pool,
            registry: MethodRegistry::new(),
            services: RwLock::new(HashMap::new()),
            descriptors: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a method binding. Typically called once per operation at
    /// startup, before the client is shared.
    pub fn register(&mut self, binding: MethodBinding) {
        self.registry.register(binding);
    }

    pub fn descriptor_pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// Invokes a registered method by name.
    ///
    /// See [`Self::invoke_binding`] for the dispatch contract.
    pub async fn invoke(&self, method: &str, args: Vec<Arg>) -> Result<InvokeOutcome, InvokeError> {
        let binding = self
            .registry
            .get(method)
            .ok_or_else(|| InvokeError::UnknownMethod(method.to_string()))?;
        self.invoke_binding(&binding, args).await
    }

    /// Invokes a method binding with the given positional arguments.
    ///
    /// Configuration problems (missing base URL, missing required parameter,
    /// unknown message type, array in a path segment) are raised before any
    /// transport call. The declared [`ResponseShape`] selects the outcome:
    ///
    /// * [`ResponseShape::Raw`] — the untouched [`HttpResponse`] is
    ///   returned; no status validation and no callbacks run.
    /// * [`ResponseShape::Deferred`] — the transport call is spawned on the
    ///   current tokio runtime and a [`DeferredResponse`] is returned
    ///   immediately; callbacks, status validation and conversion happen on
    ///   retrieval.
    /// * [`ResponseShape::Value`] — the call executes synchronously; the
    ///   callback chain runs against the raw response, a 4xx/5xx status
    ///   raises [`InvocationFailed`], and the body is converted into the
    ///   declared value.
    ///
    /// [`HttpResponse`]: crate::transport::HttpResponse
    pub async fn invoke_binding(
        &self,
        binding: &MethodBinding,
        args: Vec<Arg>,
    ) -> Result<InvokeOutcome, InvokeError> {
        let service = self.service_binding(binding.service())?;
        let request = build_request(binding, &service, &args)?;

        match binding.shape() {
            ResponseShape::Raw => {
                // The caller owns all further processing in this branch.
                let response = self.transport.execute(&request).await?;
                Ok(InvokeOutcome::Raw(response))
            }
            ResponseShape::Deferred(shape) => {
                let target = self.response_target(shape, binding.accept())?;
                let callbacks = request.callbacks().clone();
                let transport = self.transport.clone();
                let task = tokio::spawn(async move { transport.execute(&request).await });
                Ok(InvokeOutcome::Deferred(DeferredResponse::new(
                    task,
                    callbacks,
                    target,
                    binding.accept(),
                    service.timeout(),
                )))
            }
            ResponseShape::Value(shape) => {
                let target = self.response_target(shape, binding.accept())?;
                let response = self.transport.execute(&request).await?;
                request.callbacks().run(&response);
                convert::ensure_success(&response)?;
                Ok(InvokeOutcome::Value(convert::convert(
                    &target,
                    binding.accept(),
                    &response,
                )?))
            }
        }
    }

    fn service_binding(&self, service: &str) -> Result<Arc<ServiceBinding>, ConfigurationError> {
        if let Some(cached) = self
            .services
            .read()
            .expect("service cache lock poisoned")
            .get(service)
        {
            return Ok(cached.clone());
        }

        let base_url = self
            .config
            .base_url(service)
            .ok_or_else(|| ConfigurationError::MissingBaseUrl(service.to_string()))?;
        let resolved = Arc::new(ServiceBinding::new(
            base_url,
            self.config.timeout_seconds(service),
        ));

        // Racing first uses compute identical values; last writer wins.
        self.services
            .write()
            .expect("service cache lock poisoned")
            .insert(service.to_string(), resolved.clone());
        Ok(resolved)
    }

    fn response_target(
        &self,
        shape: &ValueShape,
        accept: MediaType,
    ) -> Result<ResponseTarget, ConfigurationError> {
        match shape {
            ValueShape::Unit => Ok(ResponseTarget::Unit),
            ValueShape::Text => {
                if accept.is_binary() {
                    Err(ConfigurationError::TextWithBinaryMedia(accept))
                } else {
                    Ok(ResponseTarget::Text)
                }
            }
            ValueShape::Message(full_name) => {
                Ok(ResponseTarget::Message(self.message_descriptor(full_name)?))
            }
        }
    }

    fn message_descriptor(&self, full_name: &str) -> Result<MessageDescriptor, ConfigurationError> {
        if let Some(cached) = self
            .descriptors
            .read()
            .expect("descriptor cache lock poisoned")
            .get(full_name)
        {
            return Ok(cached.clone());
        }

        let descriptor = self
            .pool
            .get_message_by_name(full_name)
            .ok_or_else(|| ConfigurationError::UnknownMessageType(full_name.to_string()))?;

        self.descriptors
            .write()
            .expect("descriptor cache lock poisoned")
            .insert(full_name.to_string(), descriptor.clone());
        Ok(descriptor)
    }
}

fn build_request(
    binding: &MethodBinding,
    service: &ServiceBinding,
    args: &[Arg],
) -> Result<ServiceRequest, ConfigurationError> {
    let callbacks = collect_callbacks(args);
    let payload = find_payload(args, binding.params());

    // Payload and query-string generation are mutually exclusive: with a
    // recognized payload the pattern is still substituted, but nothing is
    // appended as a query string.
    let url = if payload.is_some() && binding.pattern().is_empty() {
        service.base_url().to_string()
    } else {
        url::build_request_url(
            service.base_url(),
            binding.pattern(),
            binding.params(),
            args,
            payload.is_some(),
        )?
    };

    Ok(ServiceRequest {
        service: binding.service().to_string(),
        url,
        method: binding.verb(),
        accept: binding.accept(),
        body: payload.map(codec::encode),
        timeout: service.timeout(),
        callbacks,
    })
}

fn collect_callbacks(args: &[Arg]) -> CallbackChain {
    let mut chain = CallbackChain::new();
    for arg in args {
        if let Arg::Callback(callback) = arg {
            chain.append(callback.clone());
        }
    }
    chain
}

/// Selects the request payload: the sole non-absent argument when it is a
/// structured message, otherwise the first explicitly body-bound message
/// argument. No match means the request has no body.
fn find_payload<'a>(args: &'a [Arg], params: &[Option<ParamBinding>]) -> Option<&'a DynamicMessage> {
    let mut present = args.iter().filter(|arg| !arg.is_absent());
    if let (Some(Arg::Message(message)), None) = (present.next(), present.next()) {
        return Some(message);
    }

    for (position, arg) in args.iter().enumerate() {
        if let (Arg::Message(message), Some(Some(ParamBinding::Body))) = (arg, params.get(position))
        {
            return Some(message);
        }
    }
    None
}
