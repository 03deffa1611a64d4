//! Cancelable handle to an in-flight call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use tokio::task::{AbortHandle, JoinHandle};

use crate::dispatch::Dispatcher;

use super::TransportError;

/// Result of a call.
pub type CallResult<T> = Result<T, TransportError>;

/// Handle to a call running on a spawned task.
///
/// Await it to get the result. Dropping it does not cancel the call;
/// use [`Call::cancel`] for that.
#[derive(Debug)]
#[must_use = "a call runs in the background; await it or deliver its result"]
pub struct Call<T> {
    task: JoinHandle<CallResult<T>>,
    cancelled: Arc<AtomicBool>,
}

/// Cancels a call from anywhere. Cloneable.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    abort: AbortHandle,
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Requests cancellation.
    ///
    /// Aborts the in-flight transmission at its next suspension point, stops
    /// any further retries and suppresses a completion not yet delivered.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.abort.abort();
    }

    /// Returns true once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl<T: Send + 'static> Call<T> {
    /// Spawns `future` onto the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = CallResult<T>> + Send + 'static,
    {
        Self {
            task: tokio::spawn(future),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a handle that can cancel this call.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            abort: self.task.abort_handle(),
            cancelled: self.cancelled.clone(),
        }
    }

    /// Requests cancellation. See [`CancelHandle::cancel`].
    pub fn cancel(&self) {
        self.cancel_handle().cancel();
    }

    /// Delivers the result to `on_complete` on the dispatcher's context.
    ///
    /// The callback is not invoked if the call was cancelled, including when
    /// cancellation is requested after the result arrived but before the
    /// dispatcher got to run it.
    pub fn deliver_on<F>(self, dispatcher: &Dispatcher, on_complete: F) -> CancelHandle
    where
        F: FnOnce(CallResult<T>) + Send + 'static,
    {
        let handle = self.cancel_handle();
        let cancelled = self.cancelled.clone();
        let dispatcher = dispatcher.clone();

        tokio::spawn(async move {
            let result = self.await;
            if matches!(result, Err(TransportError::Cancelled)) {
                return;
            }
            let delivered = dispatcher.dispatch(move || {
                if !cancelled.load(Ordering::SeqCst) {
                    on_complete(result);
                }
            });
            if !delivered {
                tracing::debug!("Completion dropped: main loop is gone");
            }
        });

        handle
    }
}

impl<T> Future for Call<T> {
    type Output = CallResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(_) if self.cancelled.load(Ordering::SeqCst) => {
                Poll::Ready(Err(TransportError::Cancelled))
            }
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) if e.is_cancelled() => Poll::Ready(Err(TransportError::Cancelled)),
            Poll::Ready(Err(e)) => {
                let message = panic_message(e.into_panic());
                tracing::error!("Call task panicked: {message}");
                Poll::Ready(Err(TransportError::Panicked(message)))
            }
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map_or_else(|| "unknown panic payload".to_string(), |m| (*m).to_string()),
    }
}
