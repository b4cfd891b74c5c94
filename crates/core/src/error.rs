//! Error types for Confluence

use thiserror::Error;

/// Main error type for Confluence operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid stream segment {id}: {reason}")]
    InvalidSegment { id: i64, reason: String },

    #[error("Stream search failed: {0}")]
    Search(String),
}

/// Result type alias for Confluence operations
pub type Result<T> = std::result::Result<T, Error>;
