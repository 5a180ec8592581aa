//! Typed failures for the fetch and persistence stages

use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain records for one location. Recovered by skipping it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("timestamp out of range: {0}")]
    InvalidTimestamp(i64),
}

/// Failure to read or write the dataset file. Fatal for the run.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read dataset {}: {source}", .path.display())]
    Read { path: PathBuf, source: csv::Error },

    #[error("failed to write dataset {}: {source}", .path.display())]
    Write { path: PathBuf, source: csv::Error },
}
