//! Directory identity: resolve any reference to a directory into the one
//! string the store is keyed by.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::PathError;

/// Absolute, symlink-free path of an existing directory.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// Wrap an identity read back from storage without touching the filesystem.
    pub(crate) fn from_stored(identity: String) -> Self {
        Self(identity)
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for CanonicalPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

/// Canonicalize `input` against the process working directory.
pub fn canonicalize(input: impl AsRef<Path>) -> Result<CanonicalPath, PathError> {
    let input = input.as_ref();
    if input.is_absolute() {
        return resolve(input);
    }
    let cwd = env::current_dir().map_err(|err| PathError::from_io(input.to_path_buf(), err))?;
    canonicalize_in(&cwd, input)
}

/// Canonicalize `input`, resolving a relative reference against `base`.
pub fn canonicalize_in(base: &Path, input: impl AsRef<Path>) -> Result<CanonicalPath, PathError> {
    resolve(&base.join(input.as_ref()))
}

fn resolve(path: &Path) -> Result<CanonicalPath, PathError> {
    // dunce strips the `\\?\` prefix on Windows so identities stay comparable with
    // what users type; elsewhere it is plain `fs::canonicalize`.
    let resolved: PathBuf =
        dunce::canonicalize(path).map_err(|err| PathError::from_io(path.to_path_buf(), err))?;
    let meta = fs::metadata(&resolved).map_err(|err| PathError::from_io(resolved.clone(), err))?;
    if !meta.is_dir() {
        return Err(PathError::NotADirectory(resolved));
    }
    match resolved.into_os_string().into_string() {
        Ok(identity) => Ok(CanonicalPath(identity)),
        Err(raw) => Err(PathError::NotUtf8(PathBuf::from(raw))),
    }
}
