//! CLI tool for assetpack archive operations.

mod commands;
mod exit_codes;
mod output;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Single-file asset archive tool
#[derive(Parser)]
#[command(name = "assetpack")]
#[command(author, version, about = "Single-file asset archive tool", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// XOR key for encrypted records
    #[arg(long, short = 'k', env = "ASSETPACK_KEY", global = true, hide_env_values = true)]
    key: Option<String>,

    /// Encrypt payloads written by create and add
    #[arg(long, global = true)]
    encrypt: bool,

    /// Increase log verbosity (repeatable)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new archive from files and directories
    Create {
        /// Archive file to create
        archive: PathBuf,

        /// Files and directories to add (directories are not recursed)
        paths: Vec<PathBuf>,
    },

    /// Add files to an existing archive
    Add {
        /// Archive file to modify
        archive: PathBuf,

        /// Files and directories to add
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Display archive contents (alias: l)
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Include soft-deleted records
        #[arg(long, short = 'a')]
        all: bool,
    },

    /// Extract one file by name
    Extract {
        /// Archive file to read
        archive: PathBuf,

        /// Name of the file inside the archive
        name: String,

        /// Output path
        output: PathBuf,
    },

    /// Extract all files into a directory
    #[command(name = "extractall")]
    ExtractAll {
        /// Archive file to read
        archive: PathBuf,

        /// Output directory
        dir: PathBuf,
    },

    /// Verify archive integrity (CRC32) (alias: t)
    #[command(alias = "t")]
    Validate {
        /// Archive file to check
        archive: PathBuf,
    },

    /// Remove a file (soft delete)
    Remove {
        /// Archive file to modify
        archive: PathBuf,

        /// Name of the file to remove
        name: String,
    },

    /// Remove all files and reclaim their space
    #[command(name = "removeall")]
    RemoveAll {
        /// Archive file to empty
        archive: PathBuf,
    },

    /// Rename a file inside the archive
    Rename {
        /// Archive file to modify
        archive: PathBuf,

        /// Current name
        old: String,

        /// New name
        new: String,
    },

    /// Drop deleted and corrupted records and reclaim space
    Compact {
        /// Archive file to compact
        archive: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Exits with [`exit_codes::USER_INTERRUPT`] on Ctrl+C.
///
/// Returns `false` (after a warning) if no handler could be installed.
fn install_interrupt_handler() -> bool {
    match ctrlc::set_handler(move || {
        eprintln!("\nInterrupted");
        std::process::exit(exit_codes::USER_INTERRUPT);
    }) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("cannot install Ctrl+C handler: {}", e);
            false
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    install_interrupt_handler();

    let settings = commands::Settings {
        key: cli.key,
        encrypt: cli.encrypt,
    };

    let exit_code = match cli.command {
        Commands::Create { archive, paths } => commands::create(&archive, &paths, &settings),
        Commands::Add { archive, paths } => commands::add(&archive, &paths, &settings),
        Commands::List { archive, all } => commands::list(&archive, all, &settings),
        Commands::Extract {
            archive,
            name,
            output,
        } => commands::extract(&archive, &name, &output, &settings),
        Commands::ExtractAll { archive, dir } => commands::extract_all(&archive, &dir, &settings),
        Commands::Validate { archive } => commands::validate(&archive, &settings),
        Commands::Remove { archive, name } => commands::remove(&archive, &name, &settings),
        Commands::RemoveAll { archive } => commands::remove_all(&archive, &settings),
        Commands::Rename { archive, old, new } => {
            commands::rename(&archive, &old, &new, &settings)
        }
        Commands::Compact { archive } => commands::compact(&archive, &settings),
    };

    std::process::exit(exit_code.code());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extractall() {
        let cli = Cli::try_parse_from(["assetpack", "extractall", "game.asset", "out"]).unwrap();
        assert!(matches!(cli.command, Commands::ExtractAll { .. }));
    }

    #[test]
    fn test_verbose_counts() {
        let cli = Cli::try_parse_from(["assetpack", "-vv", "validate", "game.asset"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_second_interrupt_handler_is_reported() {
        assert!(install_interrupt_handler());
        assert!(!install_interrupt_handler());
    }
}
