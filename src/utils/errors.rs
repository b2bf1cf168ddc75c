use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling the runtime [`Config`](crate::Config)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Missing API key: set OPENAI_API_KEY or completion.api_key")]
    MissingApiKey,

    #[error("Invalid timeout for {name}: {reason}")]
    InvalidTimeout { name: &'static str, reason: String },

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}
