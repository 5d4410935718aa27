//! Moving a directory's variable set between the store and a `.env` file.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::canon::CanonicalPath;
use crate::dotenv::{self, Quoting};
use crate::store::{EnvStore, EnvVars};

/// Answers "may this file be overwritten?".
pub trait Confirm {
    /// `Ok(false)` means leave the file alone; `Err` aborts the whole operation.
    fn confirm_overwrite(&mut self, path: &Path) -> io::Result<bool>;
}

/// Prompts on `output` and reads one line from `input`. Only answers starting
/// with `y` or `Y` approve; anything else, including end of input, declines.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl Prompt<io::StdinLock<'static>, io::Stdout> {
    pub fn terminal() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Confirm for Prompt<R, W> {
    fn confirm_overwrite(&mut self, path: &Path) -> io::Result<bool> {
        write!(
            self.output,
            "File '{}' already exists. Overwrite? (y/N): ",
            path.display()
        )?;
        self.output.flush()?;
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }
}

/// Approves without asking, for `--yes`.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm_overwrite(&mut self, _path: &Path) -> io::Result<bool> {
        Ok(true)
    }
}

pub fn is_yes(answer: &str) -> bool {
    answer
        .trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'y'))
}

#[derive(Debug, PartialEq, Eq)]
pub enum PullOutcome {
    Written { count: usize, path: PathBuf },
    Cancelled,
}

/// Write the stored variables of `dir` to `target`, asking before replacing an
/// existing file. A declined overwrite leaves `target` untouched.
pub fn pull(
    store: &dyn EnvStore,
    dir: &CanonicalPath,
    target: &Path,
    quoting: Quoting,
    confirm: &mut dyn Confirm,
) -> Result<PullOutcome> {
    let vars = store
        .get(dir)
        .with_context(|| format!("failed to get env vars for {dir}"))?;

    if target.exists() {
        let approved = confirm
            .confirm_overwrite(target)
            .context("failed to read confirmation")?;
        if !approved {
            info!(path = %target.display(), "overwrite declined");
            return Ok(PullOutcome::Cancelled);
        }
    }

    write_env_file(target, &vars, quoting).context("failed to write env file")?;
    info!(directory = %dir, path = %target.display(), count = vars.len(), "pulled variables");
    Ok(PullOutcome::Written {
        count: vars.len(),
        path: target.to_path_buf(),
    })
}

/// Replace the stored set of `dir` with the contents of the `.env` file at `source`.
pub fn push(
    store: &mut dyn EnvStore,
    dir: &CanonicalPath,
    source: &Path,
    quoting: Quoting,
) -> Result<usize> {
    let text = fs::read_to_string(source)
        .with_context(|| format!("failed to read {}", source.display()))?;
    let vars = dotenv::parse(&text, quoting)
        .with_context(|| format!("failed to parse {}", source.display()))?;
    store
        .replace(dir, &vars)
        .with_context(|| format!("failed to store env vars for {dir}"))?;
    info!(directory = %dir, path = %source.display(), count = vars.len(), "pushed variables");
    Ok(vars.len())
}

/// Create or truncate `path` in place. An existing file keeps its mode and,
/// when it is a symlink, the link target receives the content.
pub fn write_env_file(path: &Path, vars: &EnvVars, quoting: Quoting) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("failed to create file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    dotenv::write_vars(&mut writer, vars, quoting)
        .with_context(|| format!("failed to write to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}
