//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// API server and credentials
    #[serde(default)]
    pub api: ApiSection,

    /// Transport settings
    #[serde(default)]
    pub transport: TransportSection,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetrySection,
}

/// API server section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    /// Base URL of the API server
    pub base_url: Option<String>,

    /// Static bearer token
    pub token: Option<String>,

    /// File holding the bearer token
    pub token_file: Option<PathBuf>,
}

/// Transport configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportSection {
    /// Idle timeout in seconds
    pub request_timeout: Option<u64>,

    /// Total timeout in seconds
    pub resource_timeout: Option<u64>,

    /// "ignore_local" or "default"
    pub cache_policy: Option<String>,
}

/// Retry policy configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Maximum number of retries after the first attempt
    pub limit: Option<u32>,

    /// Delay before each retry in milliseconds
    pub delay_ms: Option<u64>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# netlayer configuration file

[api]
# Base URL of the API server (default: https://yourdomain.com)
# base_url = "https://api.example.com"

# Bearer token sent with every request
# token = "your-token-here"

# File holding the bearer token, re-read before every attempt.
# Ignored when `token` is set. "~" expands to the home directory.
# token_file = "~/.config/netlayer/token"

[transport]
# Maximum idle time waiting for response data, in seconds (default: 30)
request_timeout = 30

# Maximum total time for one transmission, in seconds (default: 30)
resource_timeout = 30

# "ignore_local" always revalidates with the server, "default" leaves
# caching to intermediaries (default: "ignore_local")
# cache_policy = "ignore_local"

[retry]
# Retries after the first attempt; 0 disables retrying (default: 2)
limit = 2

# Delay before each retry in milliseconds; 0 retries at once (default: 1000)
delay_ms = 1000
"#
    .to_string()
}
