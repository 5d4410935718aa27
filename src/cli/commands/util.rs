use std::path::Path;

use anyhow::{Context, Result};

use envtamer::dotenv::Quoting;
use envtamer::paths::resolve_db_path;
use envtamer::{CanonicalPath, SqliteStore, canonicalize};

pub(crate) fn resolve_directory(directory: &Path) -> Result<CanonicalPath> {
    canonicalize(directory).context("failed to resolve directory path")
}

pub(crate) fn open_store(db: Option<&Path>) -> Result<SqliteStore> {
    let path = resolve_db_path(db)?;
    SqliteStore::open(&path)
        .with_context(|| format!("failed to open storage at {}", path.display()))
}

pub(crate) fn close_store(store: SqliteStore) -> Result<()> {
    store.close().context("failed to close storage")
}

pub(crate) fn quoting(escape: bool) -> Quoting {
    if escape {
        Quoting::Escaped
    } else {
        Quoting::Verbatim
    }
}
