//! Error types for the suite driver

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Target {url} not healthy after {attempts} attempts")]
    TargetHealthCheck { url: String, attempts: usize },

    #[error("Playwright not found. Install with: npm install && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Invalid Playwright report {path}: {reason}")]
    ReportParse { path: PathBuf, reason: String },

    #[error("No Playwright reports found under {0}")]
    NoReports(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
