//! Error types for photo-sorter
//!
//! The variants follow the life cycle of a run:
//! - Pre-run errors (configuration, invalid arguments) abort the whole run
//!   before any chunk is scheduled
//! - Chunk-scoped errors (tool start, tool execution, timeout, parse) are
//!   isolated to the chunk that produced them
//! - Copy errors are reported per file during distribution

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for photo-sorter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for photo-sorter
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "chunk_size")
        key: Option<String>,
    },

    /// A batch of image paths was empty or contained only blank entries
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The external tool could not be started
    #[error("failed to start {binary}: {source}")]
    ToolStart {
        /// Path of the binary that failed to start
        binary: PathBuf,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// The external tool reported a non-benign diagnostic on stderr
    #[error("exiftool reported an error: {stderr}")]
    ToolExecution {
        /// Full stderr output of the invocation
        stderr: String,
    },

    /// The external tool did not finish within the configured interval
    #[error("exiftool did not finish within {timeout:?}")]
    ToolTimeout {
        /// The wait interval that was exceeded
        timeout: Duration,
    },

    /// The tool response was not valid metadata JSON
    #[error("failed to parse metadata JSON at line {line}, column {column}: {source}")]
    Parse {
        /// Line of the offending position (1-based, 0 if unknown)
        line: usize,
        /// Column of the offending position (1-based, 0 if unknown)
        column: usize,
        /// Underlying parse failure
        #[source]
        source: serde_json::Error,
    },

    /// Copying a file into its destination bucket failed
    #[error("failed to copy {source_path} to {dest_path}: {source}")]
    Copy {
        /// The file being copied
        source_path: PathBuf,
        /// The intended destination
        dest_path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File collision at destination
    #[error("file collision at {path}: {reason}")]
    FileCollision {
        /// The path where the collision occurred
        path: PathBuf,
        /// The reason for the collision (e.g., "file already exists")
        reason: String,
    },

    /// Invalid path encountered
    #[error("invalid path {path}: {reason}")]
    InvalidPath {
        /// The invalid path that was encountered
        path: PathBuf,
        /// The reason the path is invalid
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a configuration error tied to a config key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Whether this error fails only the chunk that produced it.
    ///
    /// Configuration and argument errors are not chunk-scoped: they abort
    /// the run before any chunk is scheduled.
    pub fn is_chunk_scoped(&self) -> bool {
        matches!(
            self,
            Error::ToolStart { .. }
                | Error::ToolExecution { .. }
                | Error::ToolTimeout { .. }
                | Error::Parse { .. }
                | Error::Io(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Parse {
            line: source.line(),
            column: source.column(),
            source,
        }
    }
}
