//! Where the variable database lives.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tracing::debug;

pub const DB_ENV_VAR: &str = "ENVTAMER_DB";
pub const APP_DIR: &str = ".envtamer";
pub const DB_FILE: &str = "envtamer.db";

/// Default database location: `~/.envtamer/envtamer.db`.
pub fn default_db_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
    Ok(db_path_in(&home))
}

pub fn db_path_in(home: &Path) -> PathBuf {
    home.join(APP_DIR).join(DB_FILE)
}

/// Pick the explicit location when one was given (flag or `ENVTAMER_DB`),
/// otherwise the per-user default.
pub fn resolve_db_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) if !path.as_os_str().is_empty() => {
            debug!(path = %path.display(), "using explicit database location");
            Ok(path.to_path_buf())
        }
        _ => default_db_path(),
    }
}
