//! User registration endpoint.

use serde::{Deserialize, Serialize};

use crate::router::{RegisterRequest, Route};
use crate::time::{Sleeper, TokioSleeper};
use crate::transport::{Call, HttpClient, Transport};

/// Payload returned by a successful registration.
///
/// The server's schema is not fixed, so the JSON object is kept as is.
/// Bodies that are not JSON objects fail decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationResult(pub serde_json::Map<String, serde_json::Value>);

impl RegistrationResult {
    /// Returns the value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Returns true if the server sent an empty object.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for RegistrationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string_pretty(&self.0) {
            Ok(json) => f.write_str(&json),
            Err(_) => Err(std::fmt::Error),
        }
    }
}

/// Registers users against one server.
pub struct RegisterService<H, S = TokioSleeper> {
    transport: Transport<H, S>,
    base_url: String,
}

impl<H, S> Clone for RegisterService<H, S> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

impl<H, S> std::fmt::Debug for RegisterService<H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterService")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl<H, S> RegisterService<H, S> {
    /// Creates a service sending through `transport` to `base_url`.
    #[must_use]
    pub fn new(transport: Transport<H, S>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    /// The server this service talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The shared transport.
    #[must_use]
    pub const fn transport(&self) -> &Transport<H, S> {
        &self.transport
    }
}

impl<H, S> RegisterService<H, S>
where
    H: HttpClient + 'static,
    S: Sleeper + 'static,
{
    /// Starts a registration call.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn register(&self, request: RegisterRequest) -> Call<RegistrationResult> {
        tracing::debug!("Registering {request:?}");
        self.transport
            .send(&Route::Register(request).descriptor(&self.base_url))
    }
}
