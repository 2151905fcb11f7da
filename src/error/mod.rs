// Error types for picksy
// Author: kelexine (https://github.com/kelexine)

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PicksyError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    #[error("Model is still loading: {0}")]
    ModelLoading(String),

    #[error("Picksy is busy answering the previous message")]
    Busy,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PicksyError>;
