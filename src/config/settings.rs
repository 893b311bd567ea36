//! TOML-based configuration for Sieve.
//!
//! Supports a config file (sieve.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [schema]
//! path = "${SIEVE_HOME}/schema.toml"
//!
//! [query]
//! dialect = "postgres"
//! default_limit = 100
//! max_limit = 10000
//! timeout_seconds = 30
//!
//! [logging]
//! level = "info"
//! ```

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Schema path is not configured")]
    MissingSchemaPath,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the schema description lives.
    pub schema: SchemaSettings,

    /// Query compilation and execution settings.
    pub query: QuerySettings,

    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Schema description location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Path to the schema TOML (supports ${ENV_VAR} expansion).
    pub path: Option<String>,
}

/// Query settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// SQL dialect to render (postgres, duckdb).
    pub dialect: Dialect,

    /// Row limit applied when a request gives none.
    pub default_limit: u64,

    /// Upper bound for any requested limit.
    pub max_limit: u64,

    /// Per-statement execution timeout.
    pub timeout_seconds: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::Postgres,
            default_limit: 100,
            max_limit: 10_000,
            timeout_seconds: 30,
        }
    }
}

impl QuerySettings {
    /// Execution timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Resolve a requested limit: fall back to the default, clamp to the max.
    pub fn effective_limit(&self, requested: Option<u64>) -> u64 {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text and validate them.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SIEVE_CONFIG`
    /// 2. `./sieve.toml`
    /// 3. `~/.config/sieve/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SIEVE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("sieve.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("sieve").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// The schema path with environment variables expanded.
    pub fn schema_path(&self) -> Result<PathBuf, SettingsError> {
        let raw = self
            .schema
            .path
            .as_deref()
            .ok_or(SettingsError::MissingSchemaPath)?;
        Ok(PathBuf::from(expand_env_vars(raw)?))
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.query.max_limit == 0 {
            return Err(SettingsError::InvalidConfig(
                "query.max_limit must be greater than zero".to_string(),
            ));
        }
        if self.query.default_limit > self.query.max_limit {
            return Err(SettingsError::InvalidConfig(format!(
                "query.default_limit ({}) exceeds query.max_limit ({})",
                self.query.default_limit, self.query.max_limit
            )));
        }
        if self.query.timeout_seconds == 0 {
            return Err(SettingsError::InvalidConfig(
                "query.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
