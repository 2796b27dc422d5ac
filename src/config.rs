use crate::core::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::Level;

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub queries: BTreeMap<String, NamedQuery>,
}

/// Logging-related configuration.
#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    pub level: Option<String>,
    /// Include bound argument values in debug logs
    pub log_arguments: Option<bool>,
}

/// A query declared by name, with its argument and column types spelled out.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedQuery {
    pub sql: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl Config {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn log_arguments(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.log_arguments)
            .unwrap_or(false)
    }
}

impl LoggingConfig {
    /// The configured level, `INFO` when unset.
    pub fn level(&self) -> Result<Level, ConfigError> {
        match &self.level {
            None => Ok(Level::INFO),
            Some(name) => name
                .parse()
                .map_err(|_| ConfigError::InvalidLevel(name.clone())),
        }
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// let config = sqlbridge::config::load_config("sqlbridge.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    Config::from_toml_str(&content)
}
