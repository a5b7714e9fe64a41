//! Errors raised while setting up a run: reading the configuration, installing
//! logging and opening the viewing history export

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file unreadable or malformed, or no catalog client id available
    #[error("Configuration error: {0}")]
    Config(String),

    /// Viewing history export does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Viewing history path exists but is not a regular file
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Tracing subscriber or log file could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}
