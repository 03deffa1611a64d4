//! Session facade: owns the transport and the services built on it.
//!
//! A [`Session`] is an ordinary owned value. It builds its [`Transport`]
//! and services on first use, hands out shared references to them, and
//! releases them on [`Session::reset`] or drop.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::services::RegisterService;
use crate::time::{Sleeper, TokioSleeper};
use crate::transport::{
    BearerAdapter, FileToken, HttpClient, HttpError, NoopAdapter, ReqwestClient, RequestAdapter,
    SharedToken, StaticToken, Transport, TransportConfig,
};

/// Where the bearer token for every request comes from.
///
/// `Debug` output never contains a token.
#[derive(Clone, Default)]
pub enum TokenConfig {
    /// Requests are sent without an `authorization` header.
    #[default]
    None,
    /// A fixed token.
    Static(String),
    /// A file re-read before every attempt.
    File(PathBuf),
    /// A slot the application replaces at runtime.
    Shared(SharedToken),
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Static(_) => f.debug_tuple("Static").field(&"<redacted>").finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Shared(slot) => f.debug_tuple("Shared").field(slot).finish(),
        }
    }
}

impl TokenConfig {
    fn adapter(&self) -> Arc<dyn RequestAdapter> {
        match self {
            Self::None => Arc::new(NoopAdapter),
            Self::Static(token) => Arc::new(BearerAdapter::new(StaticToken::new(token.clone()))),
            Self::File(path) => Arc::new(BearerAdapter::new(FileToken::new(path))),
            Self::Shared(slot) => Arc::new(BearerAdapter::new(slot.clone())),
        }
    }
}

/// Everything needed to build a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server every service talks to.
    pub base_url: String,
    /// Timeouts, cache and retry policy of the shared transport.
    pub transport: TransportConfig,
    /// Bearer token source.
    pub token: TokenConfig,
}

impl SessionConfig {
    /// Creates a configuration for `base_url` with default transport
    /// settings and no token.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            transport: TransportConfig::default(),
            token: TokenConfig::None,
        }
    }
}

/// Errors raised while building session resources.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] HttpError),
}

type ClientFactory<H> = Box<dyn Fn(&TransportConfig) -> Result<H, HttpError> + Send + Sync>;

/// Lazily-built, shared networking resources.
///
/// Every service obtained from one session shares one transport until
/// [`Session::reset`] is called.
///
/// # Example
///
/// ```no_run
/// use netlayer::router::RegisterRequest;
/// use netlayer::session::{Session, SessionConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::new(SessionConfig::new("https://api.example.com"));
/// let result = session
///     .register()?
///     .register(RegisterRequest::new("alice", "s3cret"))
///     .await?;
/// println!("{result}");
/// # Ok(())
/// # }
/// ```
pub struct Session<H, S = TokioSleeper> {
    config: SessionConfig,
    sleeper: S,
    factory: ClientFactory<H>,
    transport: OnceLock<Transport<H, S>>,
    register: OnceLock<RegisterService<H, S>>,
}

impl<H, S> std::fmt::Debug for Session<H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.config.base_url)
            .field("built", &self.transport.get().is_some())
            .finish_non_exhaustive()
    }
}

impl Session<ReqwestClient, TokioSleeper> {
    /// Creates a session backed by [`ReqwestClient`].
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self::with_client_factory(config, TokioSleeper, ReqwestClient::with_config)
    }
}

impl<H, S: Clone> Session<H, S> {
    /// Creates a session whose client is produced by `factory`.
    ///
    /// `factory` runs once per build, i.e. on first use and after each
    /// [`Session::reset`].
    #[must_use]
    pub fn with_client_factory(
        config: SessionConfig,
        sleeper: S,
        factory: impl Fn(&TransportConfig) -> Result<H, HttpError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            sleeper,
            factory: Box::new(factory),
            transport: OnceLock::new(),
            register: OnceLock::new(),
        }
    }

    /// The session's configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the shared transport, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Client`] if the HTTP client cannot be built.
    pub fn transport(&self) -> Result<&Transport<H, S>, SessionError> {
        if let Some(transport) = self.transport.get() {
            return Ok(transport);
        }

        let client = (self.factory)(&self.config.transport).map_err(SessionError::Client)?;
        tracing::debug!("Built transport for {}", self.config.base_url);
        let transport = Transport::from_parts(
            client,
            self.sleeper.clone(),
            self.config.token.adapter(),
            self.config.transport.retry,
        );

        Ok(self.transport.get_or_init(|| transport))
    }

    /// Returns the registration service, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Client`] if the HTTP client cannot be built.
    pub fn register(&self) -> Result<&RegisterService<H, S>, SessionError> {
        if let Some(service) = self.register.get() {
            return Ok(service);
        }

        let service = RegisterService::new(self.transport()?.clone(), &self.config.base_url);
        Ok(self.register.get_or_init(|| service))
    }

    /// Returns true once the transport has been built.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.transport.get().is_some()
    }

    /// Drops the transport and every service.
    ///
    /// In-flight calls keep their own reference and finish normally. The
    /// next access builds fresh resources.
    pub fn reset(&mut self) {
        if self.transport.take().is_some() {
            tracing::debug!("Session reset for {}", self.config.base_url);
        }
        self.register.take();
    }
}

impl<H, S> Session<H, S>
where
    H: HttpClient + 'static,
    S: Sleeper + Clone + 'static,
{
    /// Opens a view-model over this session's registration service.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Client`] if the HTTP client cannot be built.
    pub fn register_view_model(
        &self,
        dispatcher: crate::dispatch::Dispatcher,
    ) -> Result<crate::viewmodel::RegisterViewModel<H, S>, SessionError> {
        Ok(crate::viewmodel::RegisterViewModel::new(
            self.register()?.clone(),
            dispatcher,
        ))
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
