//! Error types for the transport layer.

use thiserror::Error;

use crate::router::RequestBuildError;

/// Error type for a single HTTP transmission.
///
/// Describes what went wrong without dictating recovery strategy.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The HTTP library rejected the URL or request.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Terminal error of one logical call (`send` or `upload`).
///
/// Retry exhaustion is reported as [`TransportError::RetriesExhausted`]
/// wrapping the last attempt's failure, so it stays distinguishable from
/// a failure the policy declined to retry.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The descriptor could not be resolved to a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The descriptor resolved to a URL but the wire request could not be built.
    #[error("Failed to build request: {0}")]
    Build(#[source] RequestBuildError),

    /// Connection-level failure (no HTTP status observed).
    #[error("Transport failure: {0}")]
    Transport(#[source] HttpError),

    /// The server answered with a non-2xx status.
    #[error("Unexpected status {status}{}", body_suffix(.body))]
    Validation {
        /// The HTTP status code
        status: http::StatusCode,
        /// Response body, if it was valid UTF-8
        body: Option<String>,
    },

    /// The response body did not match the expected schema.
    #[error("Failed to decode response: {0}")]
    Decoding(#[source] serde_json::Error),

    /// The retry limit was reached.
    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Total attempts made, the initial one included
        attempts: u32,
        /// Failure of the final attempt
        #[source]
        last_error: Box<TransportError>,
    },

    /// The call was cancelled before it resolved.
    #[error("Request cancelled")]
    Cancelled,

    /// Code running inside the call panicked (a progress callback or token
    /// source, for instance). Carries the panic message.
    #[error("Call panicked: {0}")]
    Panicked(String),
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref()
        .filter(|b| !b.is_empty())
        .map(|b| format!(": {b}"))
        .unwrap_or_default()
}

impl TransportError {
    /// HTTP status observed for this failure, if any.
    #[must_use]
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Validation { status, .. } => Some(*status),
            Self::RetriesExhausted { last_error, .. } => last_error.status(),
            _ => None,
        }
    }

    /// Returns true for failures the retry policy may be consulted on.
    ///
    /// Decoding failures and request construction failures are final.
    #[must_use]
    pub const fn is_retry_candidate(&self) -> bool {
        matches!(
            self,
            Self::Transport(HttpError::Connection(_) | HttpError::Timeout) | Self::Validation { .. }
        )
    }

    /// Returns true if this error reports that the retry limit was reached.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}

impl From<RequestBuildError> for TransportError {
    fn from(error: RequestBuildError) -> Self {
        match error {
            RequestBuildError::InvalidUrl { url, reason } => {
                Self::InvalidUrl(format!("{url}: {reason}"))
            }
            other => Self::Build(other),
        }
    }
}

impl From<HttpError> for TransportError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::InvalidUrl(reason) => Self::InvalidUrl(reason),
            other => Self::Transport(other),
        }
    }
}
