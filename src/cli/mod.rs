mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use envtamer::logging;
use envtamer::paths::DB_ENV_VAR;

#[derive(Parser)]
#[command(
    name = "envtamer",
    version,
    about = "Keep per-directory environment variables and restore them as .env files"
)]
struct Cli {
    /// Path to the variable database (defaults to ~/.envtamer/envtamer.db)
    #[arg(long = "db", global = true, env = DB_ENV_VAR, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Increase log output on stderr; repeat for more detail
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pull environment variables from the database to a local .env file
    ///
    /// Retrieves the variables stored for DIRECTORY_NAME and writes them to a
    /// .env file in the current directory. An existing file is only replaced
    /// after confirmation.
    Pull {
        #[arg(value_name = "DIRECTORY_NAME")]
        directory: PathBuf,
        /// The name of the env file to create or update
        #[arg(short = 'f', long = "filename", default_value = ".env")]
        filename: PathBuf,
        /// Backslash-escape quoted values so any value round-trips
        #[arg(long = "escape")]
        escape: bool,
        /// Overwrite an existing file without asking
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// Store the variables of a local .env file for a directory
    ///
    /// Replaces everything previously stored for the directory.
    Push {
        #[arg(value_name = "DIRECTORY_NAME", default_value = ".")]
        directory: PathBuf,
        /// The env file to read
        #[arg(short = 'f', long = "filename", default_value = ".env")]
        filename: PathBuf,
        /// Read backslash escapes inside double-quoted values
        #[arg(long = "escape")]
        escape: bool,
    },
    /// List stored directories, or the variables of one directory
    List {
        #[arg(value_name = "DIRECTORY_NAME")]
        directory: Option<PathBuf>,
        /// Print JSON instead of plain text
        #[arg(long = "json")]
        json: bool,
    },
    /// Store a single variable for a directory
    Set {
        #[arg(value_name = "DIRECTORY_NAME")]
        directory: PathBuf,
        name: String,
        value: String,
    },
    /// Remove a single variable from a directory
    Unset {
        #[arg(value_name = "DIRECTORY_NAME")]
        directory: PathBuf,
        name: String,
    },
    /// Remove every variable stored for a directory
    Delete {
        #[arg(value_name = "DIRECTORY_NAME")]
        directory: PathBuf,
    },
}

pub(crate) fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;
    let db = cli.db.as_deref();

    match cli.command {
        Command::Pull {
            directory,
            filename,
            escape,
            yes,
        } => commands::cmd_pull(db, &directory, &filename, escape, yes),
        Command::Push {
            directory,
            filename,
            escape,
        } => commands::cmd_push(db, &directory, &filename, escape),
        Command::List { directory, json } => commands::cmd_list(db, directory.as_deref(), json),
        Command::Set {
            directory,
            name,
            value,
        } => commands::cmd_set(db, &directory, &name, &value),
        Command::Unset { directory, name } => commands::cmd_unset(db, &directory, &name),
        Command::Delete { directory } => commands::cmd_delete(db, &directory),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn pull_defaults_to_dot_env() {
        let cli = Cli::try_parse_from(["envtamer", "pull", "some/dir"]).unwrap();
        match cli.command {
            Command::Pull {
                directory,
                filename,
                escape,
                yes,
            } => {
                assert_eq!(directory, PathBuf::from("some/dir"));
                assert_eq!(filename, PathBuf::from(".env"));
                assert!(!escape);
                assert!(!yes);
            }
            _ => panic!("expected pull"),
        }
    }

    #[test]
    fn pull_accepts_short_filename_flag() {
        let cli = Cli::try_parse_from(["envtamer", "pull", ".", "-f", "local.env"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Pull { filename, .. } if filename == PathBuf::from("local.env")
        ));
    }

    #[test]
    fn pull_requires_directory() {
        assert!(Cli::try_parse_from(["envtamer", "pull"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["envtamer", "list", "--db", "/tmp/x.db", "-vv"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(cli.verbose, 2);
    }
}
