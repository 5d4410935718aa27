use std::path::Path;

use anyhow::{Context, Result};

use super::util::{close_store, open_store, resolve_directory};
use envtamer::EnvStore;

pub(crate) fn cmd_set(db: Option<&Path>, directory: &Path, name: &str, value: &str) -> Result<()> {
    let dir = resolve_directory(directory)?;
    let mut store = open_store(db)?;
    store
        .set(&dir, name, value)
        .with_context(|| format!("failed to set `{name}` for {dir}"))?;
    println!("stored `{name}` for {dir}");
    close_store(store)
}
