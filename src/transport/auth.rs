//! Per-attempt request adaptation and bearer token sources.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use http::HeaderValue;
use http::header::AUTHORIZATION;

use super::HttpRequest;

/// Mutates an outbound request right before each transmission.
///
/// Runs once per attempt, retries included, on a fresh copy of the wire
/// request.
pub trait RequestAdapter: Send + Sync {
    /// Returns the request to transmit.
    fn adapt(&self, request: HttpRequest) -> HttpRequest;
}

/// Adapter that leaves requests untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAdapter;

impl RequestAdapter for NoopAdapter {
    fn adapt(&self, request: HttpRequest) -> HttpRequest {
        request
    }
}

/// Provides the current bearer token, if any.
pub trait TokenSource: Send + Sync {
    /// Returns the token to attach, or `None` to send unauthenticated.
    fn token(&self) -> Option<String>;
}

/// No token is ever available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenSource for NoToken {
    fn token(&self) -> Option<String> {
        None
    }
}

/// A fixed token.
#[derive(Clone)]
pub struct StaticToken(String);

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StaticToken").field(&"<redacted>").finish()
    }
}

impl StaticToken {
    /// Creates a source that always yields `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// A token that can be replaced at runtime, e.g. after a refresh.
///
/// Clones share the same slot.
#[derive(Clone, Default)]
pub struct SharedToken {
    slot: Arc<RwLock<Option<String>>>,
}

impl std::fmt::Debug for SharedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedToken")
            .field("is_set", &self.token().is_some())
            .finish()
    }
}

impl SharedToken {
    /// Creates an empty shared token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored token.
    pub fn set(&self, token: Option<String>) {
        // A poisoned lock still holds a usable Option<String>.
        let mut slot = self.slot.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = token;
    }
}

impl TokenSource for SharedToken {
    fn token(&self) -> Option<String> {
        self.slot
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

/// Reads the token from a file on every call.
///
/// Surrounding whitespace is trimmed. A missing, unreadable or empty file
/// yields no token, so an external process can rotate the file while
/// calls are in flight.
///
/// The read is a blocking `std::fs` call made from the task running the
/// attempt. Keep the file small and on a local filesystem; a token on a
/// slow mount stalls that runtime worker for the length of the read.
#[derive(Debug, Clone)]
pub struct FileToken {
    path: PathBuf,
}

impl FileToken {
    /// Creates a source reading from `path`. A leading `~` is expanded to
    /// the user's home directory.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: expand_tilde(path.as_ref()),
        }
    }

    /// Returns the resolved file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenSource for FileToken {
    fn token(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) => {
                tracing::debug!("Token file {} not readable: {e}", self.path.display());
                None
            }
        }
    }
}

impl<T: TokenSource + ?Sized> TokenSource for Arc<T> {
    fn token(&self) -> Option<String> {
        (**self).token()
    }
}

/// Expands a leading `~` to the home directory. Other paths are returned as-is.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest))
}

/// Sets `authorization: Bearer <token>` when the token source has a token.
///
/// An existing `authorization` header is overwritten. Without a token, or
/// with a token that is not a valid header value, the request is returned
/// unchanged.
#[derive(Debug, Clone)]
pub struct BearerAdapter<T> {
    source: T,
}

impl<T: TokenSource> BearerAdapter<T> {
    /// Creates an adapter reading from `source`.
    #[must_use]
    pub const fn new(source: T) -> Self {
        Self { source }
    }
}

impl<T: TokenSource> RequestAdapter for BearerAdapter<T> {
    fn adapt(&self, mut request: HttpRequest) -> HttpRequest {
        let Some(token) = self.source.token() else {
            return request;
        };

        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(e) => tracing::warn!("Ignoring bearer token that is not a valid header value: {e}"),
        }
        request
    }
}
