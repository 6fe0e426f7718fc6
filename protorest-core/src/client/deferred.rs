//! # Deferred Response Handle
//!
//! Handle to an invocation executing in the background.
//!
//! The transport call is spawned on the tokio runtime at dispatch time;
//! callbacks, status validation and conversion all happen lazily on the
//! first value retrieval, and the converted value is memoized so repeated
//! retrievals never repeat network I/O or conversion work.
//!
//! State machine: `Pending → Completed | Failed | Cancelled`. All three
//! right-hand states are terminal. A retrieval timeout leaves the handle
//! `Pending` — the underlying operation keeps running and the retrieval may
//! be retried; cancelling it on timeout is the caller's decision.
use super::callback::CallbackChain;
use super::convert::{self, ConversionError, InvocationFailed, ResponseTarget, ResponseValue};
use crate::codec::MediaType;
use crate::transport::{HttpResponse, TransportError};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::timeout;

/// Errors that can occur while retrieving a deferred value.
///
/// Terminal failures are memoized: repeated retrievals return the same error
/// without repeating any work.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RetrieveError {
    #[error("The deferred invocation was cancelled")]
    Cancelled,
    #[error("Timed out after {0:?} waiting for the deferred response")]
    Timeout(Duration),
    #[error(transparent)]
    Failed(#[from] InvocationFailed),
    #[error("Transport error: '{0}'")]
    Transport(Arc<TransportError>),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("The background invocation terminated abnormally: '{0}'")]
    TaskFailed(String),
}

enum State {
    Pending(JoinHandle<Result<HttpResponse, TransportError>>),
    Completed(ResponseValue),
    Failed(RetrieveError),
    Cancelled,
}

/// A future-like handle completed by the background transport call.
pub struct DeferredResponse {
    abort: AbortHandle,
    cancelled: AtomicBool,
    state: Mutex<State>,
    callbacks: CallbackChain,
    target: ResponseTarget,
    media: MediaType,
    wait: Duration,
}

impl DeferredResponse {
    pub(crate) fn new(
        task: JoinHandle<Result<HttpResponse, TransportError>>,
        callbacks: CallbackChain,
        target: ResponseTarget,
        media: MediaType,
        wait: Duration,
    ) -> Self {
        Self {
            abort: task.abort_handle(),
            cancelled: AtomicBool::new(false),
            state: Mutex::new(State::Pending(task)),
            callbacks,
            target,
            media,
            wait,
        }
    }

    /// Cancels the underlying transport operation. Terminal: every further
    /// retrieval returns [`RetrieveError::Cancelled`].
    ///
    /// No effect once the background call has finished; an already retrieved
    /// value stays retrievable.
    pub fn cancel(&self) {
        if self.abort.is_finished() {
            return;
        }
        self.cancelled.store(true, Ordering::SeqCst);
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether the background call has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }

    /// Retrieves the converted value, waiting up to the timeout configured
    /// for the service.
    pub async fn value(&self) -> Result<ResponseValue, RetrieveError> {
        self.value_within(self.wait).await
    }

    /// Retrieves the converted value, waiting up to the given bound.
    ///
    /// On first completion the callback chain runs against the raw response,
    /// the status is validated (4xx/5xx raises [`InvocationFailed`]) and the
    /// body is converted; the result is memoized. A timeout does not cancel
    /// the underlying operation.
    pub async fn value_within(&self, wait: Duration) -> Result<ResponseValue, RetrieveError> {
        // The bound covers the whole retrieval, state lock acquisition
        // included, so a concurrent retrieval in flight can not stretch this
        // caller's wait past its own timeout.
        match timeout(wait, self.retrieve()).await {
            // Still pending; the operation is not cancelled on timeout.
            Err(_) => Err(RetrieveError::Timeout(wait)),
            Ok(result) => result,
        }
    }

    async fn retrieve(&self) -> Result<ResponseValue, RetrieveError> {
        let mut state = self.state.lock().await;

        // A reached terminal state is final; cancellation can not revoke it.
        match &*state {
            State::Completed(value) => return Ok(value.clone()),
            State::Failed(error) => return Err(error.clone()),
            State::Cancelled => return Err(RetrieveError::Cancelled),
            State::Pending(_) => {}
        }
        if self.is_cancelled() {
            *state = State::Cancelled;
            return Err(RetrieveError::Cancelled);
        }

        let State::Pending(task) = &mut *state else {
            unreachable!("terminal states returned above");
        };
        let result = match (&mut *task).await {
            Err(join_error) if join_error.is_cancelled() => Err(RetrieveError::Cancelled),
            Err(join_error) => Err(RetrieveError::TaskFailed(join_error.to_string())),
            Ok(Err(transport_error)) => Err(RetrieveError::Transport(Arc::new(transport_error))),
            Ok(Ok(response)) => self.complete(&response),
        };

        *state = match &result {
            Ok(value) => State::Completed(value.clone()),
            Err(RetrieveError::Cancelled) => State::Cancelled,
            Err(error) => State::Failed(error.clone()),
        };
        result
    }

    /// Runs the callback chain, validates the status and converts the body.
    fn complete(&self, response: &HttpResponse) -> Result<ResponseValue, RetrieveError> {
        self.callbacks.run(response);
        convert::ensure_success(response)?;
        Ok(convert::convert(&self.target, self.media, response)?)
    }
}

impl fmt::Debug for DeferredResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredResponse")
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .field("wait", &self.wait)
            .finish()
    }
}
