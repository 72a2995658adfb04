//! Error types for geoapi configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::l10n::LocaleError;

/// Result type alias using ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
///
/// All of these are fatal at startup: the process must not start serving
/// with a configuration that produced one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file {0} does not exist")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Unclosed variable substitution: ${{{0}")]
    UnclosedVariable(String),

    #[error("Environment variable {0} not set")]
    MissingVariable(String),

    #[error("Invalid server languages: {0}")]
    Locale(#[from] LocaleError),

    #[error("Invalid API rules: {0}")]
    ApiRules(String),
}
