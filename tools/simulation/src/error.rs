//! Simulation errors

use thiserror::Error;
use types::errors::EngineError;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
