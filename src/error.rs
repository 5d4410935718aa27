//! Typed failures for the canonicalizer and the variable store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A directory reference that could not be turned into a storage identity.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// Identities are stored as text, so the resolved path must be valid UTF-8.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NotUtf8(PathBuf),

    #[error("failed to resolve {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PathError {
    pub(crate) fn from_io(path: PathBuf, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            io::ErrorKind::NotADirectory => Self::NotADirectory(path),
            _ => Self::Io { path, source: err },
        }
    }
}

/// Failures reported by a [`crate::store::EnvStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Names must be non-empty and usable as the left side of a `.env` line.
    #[error("invalid variable name `{0}`")]
    InvalidName(String),

    #[error("storage unavailable")]
    StorageUnavailable(#[source] Unavailable),
}

/// Why the backing medium could not serve a request.
#[derive(Debug, Error)]
pub enum Unavailable {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("cannot prepare {}", .path.display())]
    Location {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("integrity check failed: {0}")]
    Corrupted(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::StorageUnavailable(Unavailable::Sqlite(err))
    }
}

impl From<Unavailable> for StoreError {
    fn from(err: Unavailable) -> Self {
        Self::StorageUnavailable(err)
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
