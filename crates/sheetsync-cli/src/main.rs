//! sheetsync CLI
//!
//! Keeps a directory of TSV/CSV tables in sync with the tabs of a
//! spreadsheet.

mod cli;
mod commands;
mod error;

use std::io;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} Spreadsheet sync for TSV/CSV tables", "sheetsync".green().bold());
            println!();
            println!("Run {} for available commands.", "sheetsync --help".cyan());
            Ok(())
        }
    }
}

/// Warnings and errors by default, info with `--verbose`; `RUST_LOG` wins.
fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
    tracing::debug!("Logging initialized");
}

fn execute_command(cmd: Commands) -> Result<()> {
    let cwd = std::env::current_dir()?;
    match cmd {
        Commands::Init { title, remote } => commands::run_init(&cwd, &title, remote),
        Commands::Add {
            path,
            title,
            description,
            freeze_row,
            freeze_column,
        } => commands::run_add(&cwd, &path, title, description, freeze_row, freeze_column),
        Commands::Rm { paths } => commands::run_rm(&cwd, &paths),
        Commands::Mv {
            path,
            new_path,
            yes,
        } => commands::run_mv(&cwd, &path, &new_path, yes),
        Commands::Ignore { title, revert } => commands::run_ignore(&cwd, &title, revert),
        Commands::Ls => commands::run_ls(&cwd),
        Commands::Apply { tables } => commands::run_apply(&cwd, &tables),
        Commands::Clear { keyword, titles } => commands::run_clear(&cwd, &keyword, &titles),
        Commands::Fetch => commands::run_fetch(&cwd),
        Commands::Push => commands::run_push(&cwd),
        Commands::Pull { force } => commands::run_pull(&cwd, force),
        Commands::Status { json } => commands::run_status(&cwd, json),
        Commands::Diff { titles } => commands::run_diff(&cwd, &titles),
        Commands::Delete { yes } => commands::run_delete(&cwd, yes),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "sheetsync", &mut io::stdout());
            Ok(())
        }
    }
}
