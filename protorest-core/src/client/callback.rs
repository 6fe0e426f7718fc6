//! # Response Callbacks
//!
//! Observers invoked with the raw HTTP response once it is available, before
//! status validation and conversion.
use crate::transport::HttpResponse;
use std::fmt;
use std::sync::Arc;

/// Callback interface for code that observes a raw [`HttpResponse`].
///
/// Callbacks do not need to care about status validation or conversion;
/// both happen after the chain has run.
pub trait ResponseCallback: Send + Sync {
    fn on_response(&self, response: &HttpResponse);
}

impl<F> ResponseCallback for F
where
    F: Fn(&HttpResponse) + Send + Sync,
{
    fn on_response(&self, response: &HttpResponse) {
        self(response)
    }
}

/// An order-preserving chain of response observers.
///
/// Appending wraps the existing chain: the most recently appended observer
/// runs first, previously chained observers run after. The chain is built
/// incrementally while the request is assembled and is immutable once the
/// invocation begins; clones share the underlying list.
#[derive(Clone, Default)]
pub struct CallbackChain {
    head: Option<Arc<Node>>,
}

struct Node {
    callback: Arc<dyn ResponseCallback>,
    next: Option<Arc<Node>>,
}

impl CallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observer in front of the existing chain.
    pub fn append(&mut self, callback: Arc<dyn ResponseCallback>) {
        self.head = Some(Arc::new(Node {
            callback,
            next: self.head.take(),
        }));
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Invokes every observer, most recently appended first.
    pub fn run(&self, response: &HttpResponse) {
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            current.callback.on_response(response);
            node = current.next.as_deref();
        }
    }

    fn len(&self) -> usize {
        let mut count = 0;
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            count += 1;
            node = current.next.as_deref();
        }
        count
    }
}

impl fmt::Debug for CallbackChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackChain")
            .field("len", &self.len())
            .finish()
    }
}
