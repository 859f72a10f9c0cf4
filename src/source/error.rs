//! Errors raised while obtaining metric records.

use std::path::PathBuf;
use thiserror::Error;

/// Why a single source could not produce a record.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The origin is not an https URL.
    #[error("'{0}' is not a valid origin. Please enter in correct format. Eg. https://www.example.com")]
    InvalidOrigin(String),

    /// The API answered with a non-success status.
    #[error("{code} {status}: {message}")]
    Api {
        code: u16,
        status: String,
        message: String,
    },

    /// The request never completed.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body was not the expected JSON shape.
    #[error("failed to decode metrics: {0}")]
    Decode(#[from] serde_json::Error),

    /// A local record file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A failed fetch, tagged with the origin it was for.
#[derive(Debug)]
pub struct FetchFailure {
    pub origin: String,
    pub error: SourceError,
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "URL: {} - {}", self.origin, self.error)
    }
}
