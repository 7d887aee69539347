//! Error types for Configurar

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    #[error("Cannot merge schema fields under '{key}': the existing value is not a mapping")]
    InvalidOverride { key: String },

    #[error("Invalid value for --{key}: {reason}")]
    InvalidArgument { key: String, reason: String },

    #[error("Argument '{0}' was not supplied and has no default")]
    UnresolvedArgument(String),

    #[error("Selector '{0}' was never resolved to a schema name")]
    UnresolvedSelector(String),

    #[error(
        "Parsing made no progress, leftover arguments: {0:?}. Either an unknown argument was \
         supplied or a '_class' selector needed to unlock further fields is missing"
    )]
    StalledResolution(Vec<String>),

    #[error("Schema '{schema}' has no field named '{field}'")]
    UnknownField { schema: String, field: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
