//! Tracker-Scout main entry point
//!
//! This is the command-line host for the tracker search engines. Records are
//! printed to stdout as pipe-delimited lines; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracker_scout::config::{load_config, Config, StatePaths};
use tracker_scout::output::PipePrinter;
use tracker_scout::trackers::{Engine, Megapeer, Rutracker, SearchCategory, Tracker};
use tracker_scout::RunContext;

/// Tracker-Scout: search aggregator for HTML-only torrent trackers
///
/// Each engine keeps its configuration, cookies and category cache next to
/// its TOML file.
#[derive(Parser, Debug)]
#[command(name = "tracker-scout")]
#[command(version = "1.0.0")]
#[command(about = "Search aggregator for HTML-only torrent trackers", long_about = None)]
struct Cli {
    /// Path to TOML configuration file [default: <ENGINE>.toml]
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Tracker to talk to
    #[arg(value_enum)]
    engine: EngineName,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EngineName {
    Megapeer,
    Rutracker,
}

impl EngineName {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Megapeer => "megapeer",
            Self::Rutracker => "rutracker",
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search for a phrase and print one line per result
    Search {
        phrase: String,

        /// all, movies, tv, music, games, anime, software, pictures or books
        #[arg(long, default_value = "all")]
        category: SearchCategory,
    },

    /// Download a torrent file and print "<path> <url>"
    Download { url: String },
}

impl Command {
    /// What an error record for this command refers to
    fn subject(&self) -> &str {
        match self {
            Self::Search { phrase, .. } => phrase,
            Self::Download { url } => url,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let engine = cli.engine.as_str();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.toml", engine)));

    tracing::debug!("Loading configuration from: {}", config_path.display());
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let state_dir = config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let paths = config.state_paths(state_dir, engine);

    match cli.engine {
        EngineName::Megapeer => run(Megapeer::new(), &config, paths, cli.command).await,
        EngineName::Rutracker => run(Rutracker::new(), &config, paths, cli.command).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tracker_scout=info,warn"),
            1 => EnvFilter::new("tracker_scout=debug,info"),
            2 => EnvFilter::new("tracker_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // stdout carries the records
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs one command against a tracker
///
/// Engine failures are printed as error records; only local failures
/// (like a closed stdout) end the process with an error.
async fn run<T: Tracker>(
    tracker: T,
    config: &Config,
    paths: StatePaths,
    command: Command,
) -> anyhow::Result<()> {
    let mut ctx = RunContext::new();
    let mut printer = PipePrinter::stdout();
    let engine_url = tracker.engine_url().to_string();

    let mut engine = match Engine::new(tracker, config, paths) {
        Ok(engine) => engine,
        Err(e) => {
            ctx.fail(e);
            ctx.report(&engine_url, command.subject(), &mut printer);
            return Ok(());
        }
    };

    match &command {
        Command::Search { phrase, category } => {
            tracing::info!("Searching '{}' in {}", phrase, category);
            if let Some(summary) = engine.search(&mut ctx, phrase, *category, &mut printer).await {
                tracing::info!(
                    "{} of {} results printed, {} pages failed",
                    summary.emitted,
                    summary.total,
                    summary.failed_pages
                );
            }
        }
        Command::Download { url } => {
            if let Some(file) = engine.download(&mut ctx, url, &mut printer).await {
                println!("{}", file);
            }
        }
    }

    Ok(())
}
