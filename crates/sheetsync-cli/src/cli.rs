//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// sheetsync - Keep a directory of TSV/CSV tables in sync with a spreadsheet
#[derive(Parser, Debug)]
#[command(name = "sheetsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log progress at info level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a sheetsync project in the current directory
    ///
    /// Examples:
    ///   sheetsync init --title "Gene annotations"
    ///   sheetsync init --title Genes --remote ../shared/genes.json
    Init {
        /// Spreadsheet title
        #[arg(short, long)]
        title: String,

        /// Spreadsheet document to sync with (created when missing)
        #[arg(short, long, env = "SHEETSYNC_REMOTE")]
        remote: Option<String>,
    },

    /// Start tracking a local TSV or CSV table
    Add {
        /// Path to the table
        path: PathBuf,

        /// Sheet title (defaults to the file name)
        #[arg(short, long)]
        title: Option<String>,

        /// Description stored in the manifest
        #[arg(short, long)]
        description: Option<String>,

        /// Number of header rows to freeze
        #[arg(long, default_value_t = 0)]
        freeze_row: u32,

        /// Number of leading columns to freeze
        #[arg(long, default_value_t = 0)]
        freeze_column: u32,
    },

    /// Stop tracking tables (local files are kept)
    Rm {
        /// Paths of tracked tables
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Move or rename a tracked table
    Mv {
        /// Current path
        path: PathBuf,

        /// New path; a new file name renames the sheet
        new_path: PathBuf,

        /// Overwrite an existing file without asking
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Exclude a sheet from sync
    Ignore {
        /// Sheet title
        title: String,

        /// Resume syncing the sheet
        #[arg(long)]
        revert: bool,
    },

    /// List tracked sheets
    Ls,

    /// Apply message or data-validation tables to tracked sheets
    Apply {
        /// Tables to apply
        #[arg(required = true)]
        tables: Vec<PathBuf>,
    },

    /// Remove formats, notes or data validation from sheets
    ///
    /// Examples:
    ///   sheetsync clear notes          # every sheet
    ///   sheetsync clear all Genes      # one sheet
    Clear {
        /// What to clear: formats, notes, validation or all
        keyword: String,

        /// Sheet titles (all sheets when omitted)
        titles: Vec<String>,
    },

    /// Download the remote spreadsheet into the cache
    Fetch,

    /// Upload local tables to the remote spreadsheet
    Push,

    /// Write fetched remote changes to local tables
    Pull {
        /// Also overwrite tables with local changes
        #[arg(short, long)]
        force: bool,
    },

    /// Show what changed locally and remotely
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show table diffs of modified sheets
    Diff {
        /// Sheet titles (all modified sheets when omitted)
        titles: Vec<String>,
    },

    /// Delete the spreadsheet and remove the project directory
    ///
    /// Local tables are kept.
    Delete {
        /// Delete without asking
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_no_command() {
        let cli = Cli::parse_from(["sheetsync"]);
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_verbose_after_subcommand() {
        let cli = Cli::parse_from(["sheetsync", "status", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::Status { json: false })));
    }

    #[test]
    fn parse_init_command() {
        let cli = Cli::parse_from(["sheetsync", "init", "--title", "Genes"]);
        match cli.command {
            Some(Commands::Init { title, .. }) => assert_eq!(title, "Genes"),
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn parse_delete_command() {
        let cli = Cli::parse_from(["sheetsync", "delete", "-y"]);
        assert_eq!(cli.command, Some(Commands::Delete { yes: true }));
        let cli = Cli::parse_from(["sheetsync", "delete"]);
        assert_eq!(cli.command, Some(Commands::Delete { yes: false }));
    }

    #[test]
    fn parse_add_with_freeze() {
        let cli = Cli::parse_from([
            "sheetsync",
            "add",
            "genes.tsv",
            "--title",
            "Genes",
            "--freeze-row",
            "1",
        ]);
        match cli.command {
            Some(Commands::Add {
                path,
                title,
                freeze_row,
                freeze_column,
                ..
            }) => {
                assert_eq!(path, PathBuf::from("genes.tsv"));
                assert_eq!(title.as_deref(), Some("Genes"));
                assert_eq!((freeze_row, freeze_column), (1, 0));
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn parse_rm_requires_a_path() {
        assert!(Cli::try_parse_from(["sheetsync", "rm"]).is_err());
    }

    #[test]
    fn parse_ignore_revert() {
        let cli = Cli::parse_from(["sheetsync", "ignore", "--revert", "Scratch"]);
        assert_eq!(
            cli.command,
            Some(Commands::Ignore {
                title: "Scratch".into(),
                revert: true
            })
        );
    }

    #[test]
    fn parse_clear_with_titles() {
        let cli = Cli::parse_from(["sheetsync", "clear", "notes", "Genes", "Samples"]);
        assert_eq!(
            cli.command,
            Some(Commands::Clear {
                keyword: "notes".into(),
                titles: vec!["Genes".into(), "Samples".into()],
            })
        );
    }

    #[test]
    fn parse_pull_force() {
        let cli = Cli::parse_from(["sheetsync", "pull", "-f"]);
        assert_eq!(cli.command, Some(Commands::Pull { force: true }));
    }

    #[test]
    fn parse_completions_command() {
        let cli = Cli::parse_from(["sheetsync", "completions", "bash"]);
        assert!(matches!(cli.command, Some(Commands::Completions { .. })));
    }
}
