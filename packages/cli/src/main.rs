mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    check, init, parse, reconcile, render, CheckArgs, InitArgs, ParseArgs, ReconcileArgs, RenderArgs,
};
use tracing_subscriber::EnvFilter;

/// Callscript CLI - structured sales call scripts from plain text
#[derive(Parser, Debug)]
#[command(name = "callscript")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new Callscript project
    Init(InitArgs),

    /// Parse a script text file into its block structure
    Parse(ParseArgs),

    /// Render a structure or record back to script text
    Render(RenderArgs),

    /// Validate structures and records in a file or directory
    Check(CheckArgs),

    /// Show how a persisted record would be opened for editing
    Reconcile(ReconcileArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.to_string_lossy().to_string(),
        Err(e) => {
            eprintln!("{} Cannot read current directory: {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Parse(args) => parse(args, &cwd),
        Command::Render(args) => render(args, &cwd),
        Command::Check(args) => check(args, &cwd),
        Command::Reconcile(args) => reconcile(args, &cwd),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
