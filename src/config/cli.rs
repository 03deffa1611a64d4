//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::transport::CachePolicy;

/// netlayer: client networking layer
///
/// Sends requests to a configured API server through the retrying,
/// token-injecting transport.
#[derive(Debug, Parser)]
#[command(name = "netlayer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Base URL of the API server
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// File holding the bearer token, re-read before every attempt
    #[arg(long = "token-file", global = true)]
    pub token_file: Option<PathBuf>,

    /// Maximum idle time waiting for response data, in seconds
    #[arg(long = "timeout", global = true)]
    pub request_timeout: Option<u64>,

    /// Maximum total time for one transmission, in seconds
    #[arg(long = "resource-timeout", global = true)]
    pub resource_timeout: Option<u64>,

    /// Cache policy for every request
    #[arg(long = "cache-policy", value_enum, global = true)]
    pub cache_policy: Option<CachePolicyArg>,

    /// Maximum number of retries after the first attempt
    #[arg(long = "retry-limit", global = true)]
    pub retry_limit: Option<u32>,

    /// Delay before each retry, in milliseconds
    #[arg(long = "retry-delay", global = true)]
    pub retry_delay: Option<u64>,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for netlayer
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "netlayer.toml")]
        output: PathBuf,
    },

    /// Register a user account
    Register {
        /// Account name
        #[arg(long, short)]
        username: String,

        /// Account password
        #[arg(long, short)]
        password: String,
    },
}

/// Cache policy argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CachePolicyArg {
    /// Always revalidate with the origin
    #[value(name = "ignore_local")]
    IgnoreLocal,
    /// Leave caching to intermediaries
    #[value(name = "default")]
    Default,
}

impl From<CachePolicyArg> for CachePolicy {
    fn from(arg: CachePolicyArg) -> Self {
        match arg {
            CachePolicyArg::IgnoreLocal => Self::IgnoreLocal,
            CachePolicyArg::Default => Self::Default,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
