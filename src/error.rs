//! Error types for the fleet controller.

use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum GodamError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] crate::world::store::StoreError),

    #[error("Simulation error: {0}")]
    Sim(String),
}

impl From<toml::de::Error> for GodamError {
    fn from(e: toml::de::Error) -> Self {
        GodamError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GodamError>;
