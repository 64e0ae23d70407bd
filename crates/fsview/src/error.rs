//! Error vocabulary shared by every filesystem layer.

use std::io;

use fsview_glob::PatternError;
use thiserror::Error;

/// Result alias used throughout fsview.
pub type FsResult<T> = Result<T, FsError>;

/// Filesystem errors.
///
/// Overlays raise only [`FsError::InvalidPath`] and [`FsError::NotFound`]
/// themselves; everything else comes from a wrapped filesystem and is
/// propagated unchanged.
#[derive(Debug, Error)]
pub enum FsError {
    /// The path is not well-formed. Raised before any lookup happens.
    #[error("{op} {path}: invalid argument")]
    InvalidPath { op: &'static str, path: String },

    /// No layer has an entry at this path.
    #[error("file does not exist: {path}")]
    NotFound { path: String },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    #[error(transparent)]
    BadPattern(#[from] PatternError),

    #[error("invalid view configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FsError {
    pub fn not_found(path: impl Into<String>) -> Self {
        FsError::NotFound { path: path.into() }
    }

    /// Whether this is the not-found condition, whichever layer raised it.
    ///
    /// Host-backed layers surface missing files as `io::ErrorKind::NotFound`;
    /// those count too.
    pub fn is_not_found(&self) -> bool {
        match self {
            FsError::NotFound { .. } => true,
            FsError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Whether this error came from path validation.
    pub fn is_invalid_path(&self) -> bool {
        matches!(self, FsError::InvalidPath { .. })
    }
}
