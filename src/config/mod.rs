//! Configuration module for Sieve.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, LoggingSettings, QuerySettings, SchemaSettings, Settings, SettingsError,
};
