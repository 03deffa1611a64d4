//! Default values for configuration options.
//!
//! Transport and retry defaults are taken from [`TransportConfig`] and
//! [`RetryPolicy`] so the library and the binary agree on them.

use crate::transport::{RetryPolicy, TransportConfig};

/// Default API server.
pub const BASE_URL: &str = "https://yourdomain.com";

/// Default request (idle) timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = TransportConfig::DEFAULT_REQUEST_TIMEOUT.as_secs();

/// Default resource (total) timeout in seconds.
pub const RESOURCE_TIMEOUT_SECS: u64 = TransportConfig::DEFAULT_RESOURCE_TIMEOUT.as_secs();

/// Default number of retries after the first attempt.
pub const RETRY_LIMIT: u32 = RetryPolicy::DEFAULT_LIMIT;

/// Default delay before each retry in milliseconds.
// The default delay is one second, well inside u64.
#[allow(clippy::cast_possible_truncation)]
pub const RETRY_DELAY_MS: u64 = RetryPolicy::DEFAULT_DELAY.as_millis() as u64;
