//! Presentation adapter: call outcomes as observable state.
//!
//! A view layer binds to the [`Published`] cells of a view-model and never
//! touches calls directly. Cells are written only from jobs run by the
//! [`MainLoop`](crate::dispatch::MainLoop), so observers see updates in
//! completion order on one context.

use std::sync::Arc;

use tokio::sync::watch;

use crate::dispatch::Dispatcher;
use crate::router::RegisterRequest;
use crate::services::{RegisterService, RegistrationResult};
use crate::time::{Sleeper, TokioSleeper};
use crate::transport::{CancelHandle, HttpClient, TransportError};

/// Single-slot cell holding the latest value.
///
/// Subscribers that fall behind see only the newest value, never a queue.
/// Clones share the slot.
#[derive(Debug)]
pub struct Published<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Published<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Clone> Published<T> {
    /// Creates a cell holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(initial)),
        }
    }

    /// Returns a copy of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replaces the value and notifies subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Subscribes to changes. The receiver starts at the current value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

/// Handle to one submit.
///
/// Cancelling through it stops the call and returns the form to idle, the
/// same as [`RegisterViewModel::cancel`]. Cloneable.
#[derive(Debug, Clone)]
pub struct Submission {
    handle: CancelHandle,
    is_loading: Published<bool>,
}

impl Submission {
    /// Cancels the call and sets `is_loading` to false.
    ///
    /// The cancelled call publishes nothing.
    pub fn cancel(&self) {
        self.handle.cancel();
        self.is_loading.set(false);
    }

    /// Returns true once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }
}

/// Observable state of the registration form.
///
/// Submits are not queued: when two overlap, each completion writes the
/// cells as it arrives and the last one wins.
pub struct RegisterViewModel<H, S = TokioSleeper> {
    service: RegisterService<H, S>,
    dispatcher: Dispatcher,
    is_loading: Published<bool>,
    error: Published<Option<Arc<TransportError>>>,
    result: Published<Option<RegistrationResult>>,
}

impl<H, S> std::fmt::Debug for RegisterViewModel<H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterViewModel")
            .field("is_loading", &self.is_loading.get())
            .field("error", &self.error.get())
            .field("result", &self.result.get())
            .finish_non_exhaustive()
    }
}

impl<H, S> RegisterViewModel<H, S> {
    /// Creates a view-model in its idle state.
    ///
    /// Completions are delivered through `dispatcher`.
    #[must_use]
    pub fn new(service: RegisterService<H, S>, dispatcher: Dispatcher) -> Self {
        Self {
            service,
            dispatcher,
            is_loading: Published::new(false),
            error: Published::new(None),
            result: Published::new(None),
        }
    }

    /// True while a submit is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> &Published<bool> {
        &self.is_loading
    }

    /// Failure of the most recent completed submit, cleared by a success.
    #[must_use]
    pub const fn error(&self) -> &Published<Option<Arc<TransportError>>> {
        &self.error
    }

    /// Payload of the most recent successful submit.
    #[must_use]
    pub const fn result(&self) -> &Published<Option<RegistrationResult>> {
        &self.result
    }
}

impl<H, S> RegisterViewModel<H, S>
where
    H: HttpClient + 'static,
    S: Sleeper + 'static,
{
    /// Starts a registration.
    ///
    /// `is_loading` becomes true at once. When the call completes, a job on
    /// the main loop sets it back to false and publishes the error or the
    /// result.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn submit(&self, username: impl Into<String>, password: impl Into<String>) -> Submission {
        self.is_loading.set(true);

        let is_loading = self.is_loading.clone();
        let error = self.error.clone();
        let result = self.result.clone();

        let handle = self
            .service
            .register(RegisterRequest::new(username, password))
            .deliver_on(&self.dispatcher, move |outcome| {
                is_loading.set(false);
                match outcome {
                    Ok(payload) => {
                        error.set(None);
                        result.set(Some(payload));
                    }
                    Err(e) => {
                        tracing::debug!("Registration failed: {e}");
                        error.set(Some(Arc::new(e)));
                    }
                }
            });

        Submission {
            handle,
            is_loading: self.is_loading.clone(),
        }
    }

    /// Cancels a submit and returns the form to idle.
    ///
    /// The cancelled call publishes nothing.
    pub fn cancel(&self, submission: &Submission) {
        submission.cancel();
    }
}

#[cfg(test)]
#[path = "viewmodel_tests.rs"]
mod tests;
