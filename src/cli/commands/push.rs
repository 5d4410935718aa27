use std::path::Path;

use anyhow::Result;

use super::util::{close_store, open_store, quoting, resolve_directory};
use envtamer::pull;

pub(crate) fn cmd_push(
    db: Option<&Path>,
    directory: &Path,
    filename: &Path,
    escape: bool,
) -> Result<()> {
    let dir = resolve_directory(directory)?;
    let mut store = open_store(db)?;
    let count = pull::push(&mut store, &dir, filename, quoting(escape))?;
    println!(
        "Successfully pushed {count} environment variables from file: {}",
        filename.display()
    );
    close_store(store)
}
