//! # Protorest Core
//!
//! `protorest-core` is a declarative Protobuf-over-HTTP client library. A caller
//! describes each logical service operation once — URL pattern, parameter
//! bindings, HTTP verb, desired response shape — and the library turns every
//! subsequent invocation into an HTTP request carrying Protocol-Buffer-encoded
//! messages, converting the response back into a typed result.
//!
//! ## Key Components
//!
//! * **[`client::RestClient`]:** The main entry point. It resolves service
//!   configuration, builds the request from the declared
//!   [`binding::MethodBinding`] and the runtime arguments, dispatches it through
//!   a [`transport::Transport`] and converts the response.
//! * **[`binding::MethodBinding`] & [`binding::Arg`]:** The declarative
//!   per-operation table and the runtime argument values, registered once at
//!   startup instead of being discovered through reflection.
//! * **[`client::DeferredResponse`]:** An asynchronous handle for operations
//!   declared as deferred; the network call runs in the background and
//!   conversion happens lazily on retrieval.
//!
//! ## Messages
//!
//! Structured payloads are [`prost_reflect::DynamicMessage`] values resolved
//! against the [`prost_reflect::DescriptorPool`] the client is constructed
//! with. The pool doubles as the extension registry: extension fields present
//! in a response body are resolved through it during decoding.
//!
//! ## Transports
//!
//! The core owns no network I/O. The [`transport::Transport`] trait is the seam
//! to an HTTP client; [`transport::reqwest::ReqwestTransport`] is the default
//! implementation shipped with the crate.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost` and `prost-reflect` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod binding;
pub mod client;
pub mod codec;
pub mod config;
pub mod transport;

// Re-exports
pub use prost;
pub use prost_reflect;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
