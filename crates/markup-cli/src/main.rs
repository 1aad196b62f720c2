//! Markup CLI
//!
//! Command-line host for the markup parser: diagnostics, tree dumps, token
//! listings and parser self checks

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use config::ConfigLoader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;

/// Stack of each parsing worker; syntax trees are dropped recursively along
/// their element nesting
const WORKER_STACK_SIZE: usize = 8 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "markup")]
#[command(about = "Error-tolerant parser for XML-like markup")]
#[command(version = markup_core::VERSION)]
#[command(
    long_about = "markup parses XML and XAML documents into lossless syntax trees.\n\
Malformed input never stops it: every problem is reported as a diagnostic.\n\
\n\
Examples:\n  \
markup parse src/                 # Report diagnostics for every file in src/\n  \
markup parse -f json Main.xaml    # Machine-readable diagnostics\n  \
markup tree --trivia Main.xaml    # Dump the syntax tree\n  \
markup lex --lines Main.xaml      # Per-line tokens and scanner states\n  \
markup check .                    # Round-trip and incremental self check"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (default: search for .markuprc.toml)"
    )]
    config: Option<PathBuf>,

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
    /// Parse files and report diagnostics
    Parse {
        /// Files or directories to parse
        #[arg(help = "Files or directories to process (default: current directory)")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "human", help = "Output format for diagnostics")]
        format: OutputFormat,

        /// Parse as a fragment with any number of top-level elements
        #[arg(long)]
        script: bool,
    },

    /// Print the syntax tree of a file
    Tree {
        file: PathBuf,

        /// Include trivia, with skipped tokens expanded
        #[arg(long)]
        trivia: bool,

        /// Append diagnostics after the tree
        #[arg(long)]
        diagnostics: bool,
    },

    /// Print the tokens of a file
    Lex {
        file: PathBuf,

        /// Lex line by line and show scanner states
        #[arg(long)]
        lines: bool,
    },

    /// Verify round-trip fidelity and incremental reparsing on real files
    Check {
        /// Files or directories to check
        #[arg(help = "Files or directories to process (default: current directory)")]
        paths: Vec<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// JSON format for programmatic consumption
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !cli.no_color && std::env::var("NO_COLOR").is_err() {
        colored::control::set_override(true);
    } else {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose);

    let mut pool = rayon::ThreadPoolBuilder::new().stack_size(WORKER_STACK_SIZE);
    if let Some(threads) = cli.threads {
        pool = pool.num_threads(threads);
    }
    if let Err(e) = pool.build_global() {
        error!("Failed to configure thread pool: {}", e);
        return ExitCode::FAILURE;
    }

    match run_command(cli) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Verbosity flag to a `markup` target filter; `RUST_LOG` wins when set
fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "markup=error",
        1 => "markup=warn",
        2 => "markup=info",
        3 => "markup=debug",
        _ => "markup=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn default_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    }
}

/// Directory the configuration search starts from
fn config_start(path: &Path) -> &Path {
    if path.is_file() {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    } else {
        path
    }
}

/// Runs the command; `Ok(true)` means errors were reported
fn run_command(cli: Cli) -> Result<bool> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(false);
    };

    let first_path = match &command {
        Commands::Parse { paths, .. } | Commands::Check { paths } => {
            paths.first().cloned().unwrap_or_else(|| PathBuf::from("."))
        }
        Commands::Tree { file, .. } | Commands::Lex { file, .. } => file.clone(),
    };
    let mut config = ConfigLoader::load(cli.config.as_deref(), config_start(&first_path))?;

    match command {
        Commands::Parse {
            paths,
            format,
            script,
        } => {
            if script {
                config.parser.source_kind = markup_core::SourceKind::Script;
            }
            commands::parse_command(&default_paths(paths), format, &config)
        }
        Commands::Tree {
            file,
            trivia,
            diagnostics,
        } => commands::tree_command(&file, trivia, diagnostics, &config),
        Commands::Lex { file, lines } => commands::lex_command(&file, lines, &config),
        Commands::Check { paths } => commands::check_command(&default_paths(paths), &config),
    }
}
