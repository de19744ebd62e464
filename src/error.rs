//! Error types.
//!
//! Storage errors never reach the compiler front end: the overlay downgrades
//! them to `false` / `None` at the point of use. Parse and write failures are
//! reported as messages through caller-supplied callbacks.

use std::io;

use thiserror::Error;

use crate::path::CanonicalPath;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure of a persistent-layer or memory-layer operation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing exists at the path.
    #[error("file not found: {0}")]
    NotFound(CanonicalPath),

    /// The path is a directory where a file was expected.
    #[error("path is a directory: {0}")]
    IsDirectory(CanonicalPath),

    /// The path (or one of its ancestors) is a file where a directory was expected.
    #[error("path is not a directory: {0}")]
    NotADirectory(CanonicalPath),

    /// Access was denied by the backend.
    #[error("permission denied: {0}")]
    PermissionDenied(CanonicalPath),

    /// Any other I/O failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: CanonicalPath,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// Map an I/O error to the matching storage error.
    pub fn from_io(err: io::Error, path: &CanonicalPath) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.clone()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.clone()),
            io::ErrorKind::IsADirectory => Self::IsDirectory(path.clone()),
            io::ErrorKind::NotADirectory => Self::NotADirectory(path.clone()),
            _ => Self::Io {
                path: path.clone(),
                source: err,
            },
        }
    }

    /// Whether this is an expected "missing" condition rather than a backend fault.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::IsDirectory(_) | Self::NotADirectory(_)
        )
    }
}

/// Failure to turn file text into a parsed representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The parser rejected the text.
    #[error("{message}")]
    Syntax {
        /// Parser message.
        message: String,
    },
}

impl ParseError {
    /// Create a syntax error with a message.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }
}

/// Failure to load a [`Config`](crate::config::Config) from JSON.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON.
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is valid JSON but not an object.
    #[error("config must be a JSON object")]
    NotAnObject,

    /// A recognized option has the wrong type.
    #[error("config option `{field}` must be a {expected}")]
    InvalidField {
        /// Option name.
        field: &'static str,
        /// Expected JSON type.
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathResolver;

    #[test]
    fn test_from_io_maps_kinds() {
        let path = PathResolver::new("/").resolve("/a.txt");

        let err = StorageError::from_io(io::Error::from(io::ErrorKind::NotFound), &path);
        assert!(matches!(err, StorageError::NotFound(_)));
        assert!(err.is_missing());

        let err = StorageError::from_io(io::Error::from(io::ErrorKind::PermissionDenied), &path);
        assert!(matches!(err, StorageError::PermissionDenied(_)));
        assert!(!err.is_missing());

        let err = StorageError::from_io(io::Error::other("disk on fire"), &path);
        assert!(matches!(err, StorageError::Io { .. }));
        assert_eq!(err.to_string(), "I/O error at /a.txt: disk on fire");
    }
}
