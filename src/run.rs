//! Application execution logic.
//!
//! Drives one registration through the session, the view-model and the
//! main loop, the way an interactive front end would.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::signal;

use netlayer::config::ValidatedConfig;
use netlayer::dispatch::main_context;
use netlayer::services::RegistrationResult;
use netlayer::session::{Session, SessionError};
use netlayer::time::Sleeper;
use netlayer::transport::{HttpClient, TransportError};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// The session could not build its transport.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The server call failed.
    #[error("Registration failed: {0}")]
    Request(Arc<TransportError>),

    /// Interrupted before the call completed.
    #[error("Interrupted before the request completed")]
    Interrupted,

    /// The main loop stopped before delivering a result.
    #[error("Main loop closed before the request completed")]
    MainLoopClosed,
}

/// Registers `username` against the configured server and prints the result.
///
/// Ctrl-C cancels the call.
///
/// # Errors
///
/// Returns an error if the session cannot be built, the call fails, or the
/// user interrupts it.
#[cfg(not(tarpaulin_include))]
pub async fn execute(
    config: ValidatedConfig,
    username: String,
    password: String,
) -> Result<(), RunError> {
    let session = Session::new(config.session_config());
    tracing::info!("Registering '{username}' at {}", config.base_url);

    let result = register(&session, username, password, shutdown_signal()).await?;

    tracing::info!("Registration succeeded");
    println!("{result}");
    Ok(())
}

/// Submits one registration and runs the main loop until the view-model
/// stops loading or `shutdown` resolves.
async fn register<H, S>(
    session: &Session<H, S>,
    username: String,
    password: String,
    shutdown: impl Future<Output = ()>,
) -> Result<RegistrationResult, RunError>
where
    H: HttpClient + 'static,
    S: Sleeper + Clone + 'static,
{
    let (dispatcher, mut main_loop) = main_context();
    let view_model = session.register_view_model(dispatcher)?;
    let handle = view_model.submit(username, password);

    tokio::pin!(shutdown);
    while view_model.is_loading().get() {
        tokio::select! {
            () = &mut shutdown => {
                view_model.cancel(&handle);
                return Err(RunError::Interrupted);
            }
            ran = main_loop.run_next() => {
                if !ran {
                    return Err(RunError::MainLoopClosed);
                }
            }
        }
    }

    if let Some(error) = view_model.error().get() {
        return Err(RunError::Request(error));
    }
    view_model.result().get().ok_or(RunError::MainLoopClosed)
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}
