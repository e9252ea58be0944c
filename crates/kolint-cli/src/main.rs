//! Kolint CLI
//!
//! Command-line interface for the Kotlin indentation checker

mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use kolint_core::{DEFAULT_LOG_FILTER, init_tracing};
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "kolint")]
#[command(about = "Checks and fixes the indentation of Kotlin sources")]
#[command(version = kolint_core::VERSION)]
#[command(
    long_about = "kolint checks that every line of a Kotlin source is indented the way its \
syntactic position requires, and rewrites the whitespace when asked to.\n\
\n\
Examples:\n  \
kolint check                 # Check the current directory\n  \
kolint fix src/              # Fix files under src/ in place\n  \
kolint fix --dry-run Main.kt # Show the fix as a diff\n  \
kolint rules                 # List the built-in rules"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (kolint.toml/.yaml/.json)"
    )]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Number of threads to use for parallel processing
    #[arg(
        short = 'j',
        long,
        global = true,
        help = "Number of threads (default: number of CPU cores)"
    )]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report indentation problems
    Check {
        /// Files or directories to check
        #[arg(help = "Files or directories to process (default: current directory)")]
        paths: Vec<PathBuf>,
    },

    /// Rewrite files with corrected indentation
    Fix {
        /// Files or directories to fix
        #[arg(help = "Files or directories to process (default: current directory)")]
        paths: Vec<PathBuf>,

        /// Print the changes as unified diffs instead of writing them
        #[arg(long, help = "Show proposed fixes without applying them")]
        dry_run: bool,
    },

    /// List the built-in rules
    Rules,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// JSON for programmatic consumption
    Json,
}

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Clean,
    ViolationsFound,
    Failed,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Clean => ExitCode::SUCCESS,
            Status::ViolationsFound => ExitCode::from(1),
            Status::Failed => ExitCode::from(2),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let colors = !cli.no_color && std::env::var_os("NO_COLOR").is_none();
    colored::control::set_override(colors);

    let log_filter = match cli.verbose {
        0 => DEFAULT_LOG_FILTER,
        1 => "kolint=debug",
        _ => "kolint=trace",
    };
    init_tracing(log_filter);

    if let Some(threads) = cli.threads
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        error!("Failed to set thread pool size: {}", e);
        return Status::Failed.into();
    }

    match run_command(cli) {
        Ok(status) => {
            debug!("Finished with {:?}", status);
            status.into()
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            Status::Failed.into()
        }
    }
}

fn run_command(cli: Cli) -> anyhow::Result<Status> {
    let options = commands::Options {
        config: cli.config,
        format: cli.format,
        verbose: cli.verbose > 0,
    };
    match cli.command {
        Commands::Check { paths } => commands::check_command(default_paths(paths), &options),
        Commands::Fix { paths, dry_run } => {
            commands::fix_command(default_paths(paths), dry_run, &options)
        }
        Commands::Rules => commands::rules_command(&options),
    }
}

fn default_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    }
}
