//! Error types for session persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting snapshots and workspaces.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failed to read a file.
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a directory.
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse or produce JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    /// Creates a read-file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SessionError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a write-file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SessionError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a create-directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SessionError::CreateDir {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn factories_produce_matching_variants() {
        assert!(matches!(
            SessionError::read_file("/a", mock_io_err()),
            SessionError::ReadFile { .. }
        ));
        assert!(matches!(
            SessionError::write_file("/a", mock_io_err()),
            SessionError::WriteFile { .. }
        ));
        assert!(matches!(
            SessionError::create_dir("/a", mock_io_err()),
            SessionError::CreateDir { .. }
        ));
    }

    #[test]
    fn io_variants_expose_their_source() {
        let err = SessionError::read_file("/a/b.json", mock_io_err());
        assert!(err.source().is_some());
        let msg = err.to_string();
        assert!(msg.contains("failed to read file"), "got: {msg}");
        assert!(msg.contains("/a/b.json"), "got: {msg}");
    }

    #[test]
    fn json_errors_convert() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: SessionError = parse_err.into();
        assert!(matches!(err, SessionError::Json(_)));
        assert!(err.to_string().starts_with("invalid JSON"));
    }
}
