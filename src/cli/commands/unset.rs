use std::path::Path;

use anyhow::{Context, Result};

use super::util::{close_store, open_store, resolve_directory};
use envtamer::EnvStore;

pub(crate) fn cmd_unset(db: Option<&Path>, directory: &Path, name: &str) -> Result<()> {
    let dir = resolve_directory(directory)?;
    let mut store = open_store(db)?;
    store
        .unset(&dir, name)
        .with_context(|| format!("failed to unset `{name}` for {dir}"))?;
    println!("removed `{name}` from {dir}");
    close_store(store)
}
