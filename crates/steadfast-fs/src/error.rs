//! Error types for steadfast-fs

use std::path::PathBuf;

use crate::writer::Stage;

/// Result type for steadfast-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in steadfast-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised before any temporary file is created.
    #[error("Permission denied: {path} is not writable")]
    PermissionDenied { path: PathBuf },

    /// The file changed on disk since it was last read.
    #[error("File changed on disk: {path}")]
    Conflict { path: PathBuf },

    #[error("Content of {path} is not valid text in the configured encoding")]
    Decode { path: PathBuf },

    #[error("Can not handle file URI {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("{path} is not below {base}")]
    PathEscape { path: PathBuf, base: PathBuf },

    #[error("Write session is {found:?}, expected {expected:?}")]
    OutOfOrder { expected: Stage, found: Stage },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} config for {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Like [`Error::io`], but reports OS permission failures as
    /// [`Error::PermissionDenied`].
    pub fn classify(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path }
        } else {
            Self::Io { path, source }
        }
    }

    /// Whether this error is a refused write due to an external modification.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
