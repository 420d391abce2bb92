//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Errors that can occur when loading or validating `featc.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No configuration file exists at the expected location.
    #[error("no featc.toml found at {}", path.display())]
    NotFound {
        /// Path that was tried.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML content could not be parsed into a configuration.
    #[error("invalid featc.toml: {0}")]
    Parse(String),

    /// A required value is empty.
    #[error("featc.toml is missing `{0}`")]
    MissingField(&'static str),

    /// A value is present but malformed.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Dotted key of the offending value.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound { path }
        } else {
            ConfigError::Read { path, source }
        }
    }
}
