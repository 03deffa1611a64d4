//! Designated completion context.
//!
//! Calls complete on whatever worker task happened to run them. Observers
//! that want a single, ordered context (the "main thread" of a UI) post
//! their completions through a [`Dispatcher`]; one [`MainLoop`] runs them
//! one at a time in submission order.

use tokio::sync::mpsc;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Creates a connected dispatcher / main loop pair.
#[must_use]
pub fn main_context() -> (Dispatcher, MainLoop) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Dispatcher { tx }, MainLoop { rx })
}

/// Cloneable handle that queues jobs onto the [`MainLoop`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Job>,
}

impl Dispatcher {
    /// Queues `job` to run on the main loop.
    ///
    /// Returns `false` if the main loop has been dropped; the job is then
    /// discarded.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(job)).is_ok()
    }

    /// Returns true while the main loop is alive.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Executes dispatched jobs sequentially.
pub struct MainLoop {
    rx: mpsc::UnboundedReceiver<Job>,
}

impl std::fmt::Debug for MainLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainLoop").finish_non_exhaustive()
    }
}

impl MainLoop {
    /// Runs jobs until every [`Dispatcher`] has been dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            job();
        }
        tracing::debug!("Main loop finished: all dispatchers dropped");
    }

    /// Runs the next job, waiting for one to arrive.
    ///
    /// Returns `false` once every [`Dispatcher`] has been dropped.
    pub async fn run_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Runs every job already queued without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }
}
