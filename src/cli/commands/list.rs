use std::path::Path;

use anyhow::{Context, Result};

use super::util::{close_store, open_store, resolve_directory};
use envtamer::EnvStore;
use envtamer::dotenv::{self, Quoting};

pub(crate) fn cmd_list(db: Option<&Path>, directory: Option<&Path>, json: bool) -> Result<()> {
    let dir = directory.map(resolve_directory).transpose()?;
    let store = open_store(db)?;

    match dir {
        Some(dir) => {
            let vars = store
                .get(&dir)
                .with_context(|| format!("failed to get env vars for {dir}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&vars)?);
            } else if vars.is_empty() {
                println!("no environment variables stored for {dir}");
            } else {
                print!("{}", dotenv::to_string(&vars, Quoting::Verbatim));
            }
        }
        None => {
            let records = store.directories().context("failed to list directories")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("no directories stored");
            } else {
                for record in records {
                    println!("{} ({} variables)", record.directory, record.variables);
                }
            }
        }
    }
    close_store(store)
}
