//! Configuration errors

use std::fmt::Display;
use std::path::PathBuf;

/// Errors that can occur while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config: `{field}` {reason}")]
    MissingField { field: String, reason: String },

    #[error("config: invalid certificate in `{field}`: {reason}")]
    InvalidCertificate { field: String, reason: String },

    #[error("config: failed to read `{field}`: {source}")]
    Io {
        field: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config: failed to read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config: failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub fn missing(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn certificate(field: impl Into<String>, reason: impl Display) -> Self {
        Self::InvalidCertificate {
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
