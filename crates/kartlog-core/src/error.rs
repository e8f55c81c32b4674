//! Error types for Kartlog.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("No lap data found in file")]
    NoLapData,

    #[error("Lap {index}: {reason}")]
    InvalidLap { index: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
