use std::path::Path;

use anyhow::{Context, Result};

use super::util::{close_store, open_store, resolve_directory};
use envtamer::EnvStore;

pub(crate) fn cmd_delete(db: Option<&Path>, directory: &Path) -> Result<()> {
    let dir = resolve_directory(directory)?;
    let mut store = open_store(db)?;
    store
        .delete(&dir)
        .with_context(|| format!("failed to delete env vars for {dir}"))?;
    println!("deleted all environment variables for {dir}");
    close_store(store)
}
