use std::path::Path;

use anyhow::Result;

use super::util::{close_store, open_store, quoting, resolve_directory};
use envtamer::pull::{self, AssumeYes, Confirm, Prompt, PullOutcome};

pub(crate) fn cmd_pull(
    db: Option<&Path>,
    directory: &Path,
    filename: &Path,
    escape: bool,
    yes: bool,
) -> Result<()> {
    let dir = resolve_directory(directory)?;
    let store = open_store(db)?;

    let mut assume_yes = AssumeYes;
    let mut prompt;
    let confirm: &mut dyn Confirm = if yes {
        &mut assume_yes
    } else {
        prompt = Prompt::terminal();
        &mut prompt
    };

    match pull::pull(&store, &dir, filename, quoting(escape), confirm)? {
        PullOutcome::Written { count, path } => println!(
            "Successfully pulled {count} environment variables to file: {}",
            path.display()
        ),
        PullOutcome::Cancelled => println!("Operation cancelled."),
    }
    close_store(store)
}
