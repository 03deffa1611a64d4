//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use http::HeaderValue;
use url::Url;

use crate::session::{SessionConfig, TokenConfig};
use crate::transport::{CachePolicy, RetryPolicy, TransportConfig, expand_tilde};

use super::cli::Cli;
use super::defaults;
use super::error::ConfigError;
use super::toml::TomlConfig;

/// Where the bearer token comes from after validation.
#[derive(Clone, PartialEq, Eq)]
pub enum TokenSetting {
    /// No token.
    None,
    /// A token given directly.
    Static(String),
    /// A token file, `~` already expanded.
    File(PathBuf),
}

impl fmt::Debug for TokenSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Static(_) => f.debug_tuple("Static").field(&"<redacted>").finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// API server every request goes to
    pub base_url: Url,

    /// Bearer token source
    pub token: TokenSetting,

    /// Maximum idle time waiting for data
    pub request_timeout: Duration,

    /// Maximum total time per transmission
    pub resource_timeout: Duration,

    /// Cache policy for every request
    pub cache_policy: CachePolicy,

    /// Retry policy for failed requests
    pub retry_policy: RetryPolicy,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match &self.token {
            TokenSetting::None => "none".to_string(),
            TokenSetting::Static(_) => "static".to_string(),
            TokenSetting::File(path) => format!("file {}", path.display()),
        };

        write!(
            f,
            "Config {{ base_url: {}, token: {}, timeouts: {}s/{}s, cache: {:?}, retry: {}x/{}ms }}",
            self.base_url,
            token,
            self.request_timeout.as_secs(),
            self.resource_timeout.as_secs(),
            self.cache_policy,
            self.retry_policy.limit,
            self.retry_policy.delay.as_millis(),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values, which take
    /// precedence over built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The base URL is invalid or not http(s)
    /// - A timeout is zero
    /// - The token cannot be sent as a header value
    /// - The cache policy name is unknown
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let base_url = Self::resolve_base_url(cli, toml)?;
        let token = Self::resolve_token(cli, toml)?;

        let request_timeout = Self::resolve_timeout(
            "request_timeout",
            cli.request_timeout,
            toml.and_then(|t| t.transport.request_timeout),
            defaults::REQUEST_TIMEOUT_SECS,
        )?;
        let resource_timeout = Self::resolve_timeout(
            "resource_timeout",
            cli.resource_timeout,
            toml.and_then(|t| t.transport.resource_timeout),
            defaults::RESOURCE_TIMEOUT_SECS,
        )?;

        let cache_policy = Self::resolve_cache_policy(cli, toml)?;
        let retry_policy = Self::build_retry_policy(cli, toml);

        Ok(Self {
            base_url,
            token,
            request_timeout,
            resource_timeout,
            cache_policy,
            retry_policy,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    /// The transport settings.
    #[must_use]
    pub const fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            request_timeout: self.request_timeout,
            resource_timeout: self.resource_timeout,
            cache_policy: self.cache_policy,
            retry: self.retry_policy,
        }
    }

    /// Everything a [`Session`](crate::session::Session) needs.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        let token = match &self.token {
            TokenSetting::None => TokenConfig::None,
            TokenSetting::Static(token) => TokenConfig::Static(token.clone()),
            TokenSetting::File(path) => TokenConfig::File(path.clone()),
        };

        SessionConfig {
            base_url: self.base_url.to_string(),
            transport: self.transport_config(),
            token,
        }
    }

    fn resolve_base_url(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Url, ConfigError> {
        let url_str = cli
            .base_url
            .as_deref()
            .or_else(|| toml.and_then(|t| t.api.base_url.as_deref()))
            .unwrap_or(defaults::BASE_URL);

        let invalid = |reason: &str| ConfigError::InvalidUrl {
            url: url_str.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(url_str).map_err(|e| invalid(&e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("URL cannot be a base"));
        }

        Ok(url)
    }

    fn resolve_token(cli: &Cli, toml: Option<&TomlConfig>) -> Result<TokenSetting, ConfigError> {
        let api = toml.map(|t| &t.api);

        // A static token from either source beats a token file from either source
        let token = cli
            .token
            .as_deref()
            .or_else(|| api.and_then(|a| a.token.as_deref()));

        if let Some(token) = token {
            let token = token.trim();
            if token.is_empty() {
                return Err(ConfigError::InvalidToken {
                    reason: "token is empty".to_string(),
                });
            }
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                ConfigError::InvalidToken {
                    reason: e.to_string(),
                }
            })?;
            return Ok(TokenSetting::Static(token.to_string()));
        }

        let file = cli
            .token_file
            .as_deref()
            .or_else(|| api.and_then(|a| a.token_file.as_deref()));

        Ok(file.map_or(TokenSetting::None, |path| {
            TokenSetting::File(expand_tilde(path))
        }))
    }

    fn resolve_timeout(
        field: &'static str,
        cli: Option<u64>,
        toml: Option<u64>,
        default: u64,
    ) -> Result<Duration, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let seconds = cli.or(toml).unwrap_or(default);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field,
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_secs(seconds))
    }

    fn resolve_cache_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<CachePolicy, ConfigError> {
        if let Some(policy) = cli.cache_policy {
            return Ok(policy.into());
        }

        toml.and_then(|t| t.transport.cache_policy.as_deref())
            .map_or(Ok(CachePolicy::default()), parse_cache_policy)
    }

    fn build_retry_policy(cli: &Cli, toml: Option<&TomlConfig>) -> RetryPolicy {
        let retry = toml.map(|t| &t.retry);

        // Priority: CLI explicit > TOML > default
        let limit = cli
            .retry_limit
            .or_else(|| retry.and_then(|r| r.limit))
            .unwrap_or(defaults::RETRY_LIMIT);

        let delay_ms = cli
            .retry_delay
            .or_else(|| retry.and_then(|r| r.delay_ms))
            .unwrap_or(defaults::RETRY_DELAY_MS);

        RetryPolicy::new()
            .with_limit(limit)
            .with_delay(Duration::from_millis(delay_ms))
    }
}

/// Writes the commented configuration template to `path`.
///
/// # Errors
///
/// Returns [`ConfigError::FileWrite`] if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_cache_policy(s: &str) -> Result<CachePolicy, ConfigError> {
    match s.to_lowercase().as_str() {
        "ignore_local" | "ignore-local" | "no-cache" => Ok(CachePolicy::IgnoreLocal),
        "default" => Ok(CachePolicy::Default),
        _ => Err(ConfigError::InvalidCachePolicy {
            value: s.to_string(),
        }),
    }
}
