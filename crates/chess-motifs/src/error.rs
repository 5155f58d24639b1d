//! Analyzer error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MotifError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
