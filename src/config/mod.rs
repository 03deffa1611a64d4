//! Configuration layer for netlayer.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! # Token Sources
//!
//! A static token (`--token` or `api.token`) always wins over a token file
//! (`--token-file` or `api.token_file`), whichever source each comes from.
//! A token file is re-read before every attempt, so an external process can
//! rotate it while the program runs.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;


pub use cli::{CachePolicyArg, Cli, Command};
pub use error::ConfigError;
pub use toml::{TomlConfig, default_config_template};
pub use validated::{TokenSetting, ValidatedConfig, write_default_config};
