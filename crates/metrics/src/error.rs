//! Error types for metrics persistence

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using MetricsError
pub type Result<T> = std::result::Result<T, MetricsError>;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}
