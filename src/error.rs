use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date '{input}' (expected YYYY-MM-DD): {source}")]
    InvalidDate {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Failed to process file '{path}': {source}")]
    FileProcessing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read metadata for '{path}': {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl DetectiveError {
    /// Per-file failures are reported and skipped; everything else aborts the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            DetectiveError::FileProcessing { .. } | DetectiveError::Metadata { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DetectiveError>;
