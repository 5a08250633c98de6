// Error types for hook and translator configuration

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Hook \"{0}\" does not exist in config")]
    UnknownHook(String),

    #[error("Translator \"{0}\" does not exist in config")]
    UnknownTranslator(String),

    #[error("Translator \"{translator}\" uses unknown variant \"{variant}\"")]
    UnknownVariant { translator: String, variant: String },

    #[error("Section \"{section}\" is missing required field \"{field}\"")]
    MissingField { section: String, field: String },

    #[error("Missing required parameter \"{0}\"")]
    MissingParameter(String),

    #[error("Invalid value for parameter \"{name}\": {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unable to read template {path:?}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Hook \"{hook}\" is misconfigured: {source}")]
    InvalidHook {
        hook: String,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("Unable to build translator \"{translator}\": {source}")]
    Construction {
        translator: String,
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
