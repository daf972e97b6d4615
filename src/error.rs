// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HoundError {
    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Cache artifact error: {0}")]
    Cache(String),

    #[error("Source history error: {0}")]
    History(String),

    #[error("Generic error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, HoundError>;

// Allow `?` on std::io::Error by converting to HoundError::Io with unknown path.
impl From<std::io::Error> for HoundError {
    fn from(source: std::io::Error) -> Self {
        HoundError::Io {
            source,
            path: PathBuf::from("<unknown>"),
        }
    }
}

impl From<serde_json::Error> for HoundError {
    fn from(e: serde_json::Error) -> Self {
        HoundError::Cache(e.to_string())
    }
}

impl HoundError {
    /// Wraps an I/O error with the path that produced it.
    #[must_use]
    pub fn io(source: std::io::Error, path: &std::path::Path) -> Self {
        HoundError::Io {
            source,
            path: path.to_path_buf(),
        }
    }
}
