//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither a configured folder nor a platform data directory exists.
    #[error("No log folder available")]
    NoLogFolder,

    /// Invalid configuration file.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// The drain worker thread could not be started.
    #[error("Failed to spawn drain worker: {0}")]
    WorkerSpawn(std::io::Error),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
