//! Error types for annotation runs.
//!
//! Neither error type aborts a run: a [`ServiceError`] degrades one
//! comment to "absent", an [`AnnotateError`] degrades one file to a
//! verbatim copy.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// A documentation request that produced no usable text.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("OPENAI_API_KEY not found in environment variables")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("empty response from model")]
    EmptyResponse,

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// A failure that prevents one file from being annotated.
#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to discover sources: {0}")]
    Discovery(#[from] walkdir::Error),

    #[error("output directory {} overlaps the input tree", .0.display())]
    OverlapsInput(PathBuf),
}

impl AnnotateError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnnotateError>;
