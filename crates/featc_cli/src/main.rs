//! featc CLI — the command-line front end of the feature file compiler.
//!
//! Provides `featc build` for cached, dependency-ordered compilation,
//! `featc graph` for inspecting module dependencies, and `featc cache` for
//! cache maintenance.

#![warn(missing_docs)]

mod build;
mod cache;
mod graph;
mod logging;
mod orchestrator;
mod pipeline;
mod transform;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// featc — compiles feature files into code, in dependency order, with caching.
#[derive(Parser, Debug)]
#[command(name = "featc", version, about = "Feature file compiler")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `featc.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile all feature files.
    Build(BuildArgs),
    /// Show module dependencies and the build order.
    Graph(GraphArgs),
    /// Inspect or maintain the compilation cache.
    #[command(subcommand)]
    Cache(CacheCommand),
}

/// Arguments for the `featc build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Do not read or write the cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Recompile everything, refreshing cached results.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `featc graph` subcommand.
#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// `featc cache` subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Show entry count and size.
    Stats {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },
    /// Remove one entry, or every entry when no key is given.
    Clear {
        /// Fingerprint of the entry to remove.
        key: Option<String>,
    },
    /// Evict least-recently-used entries down to a size budget.
    Evict {
        /// Budget such as "50MB" (defaults to `[cache] max_size`).
        #[arg(long)]
        max_size: Option<String>,
    },
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    // Best-effort read of the log level; commands report config errors themselves.
    let configured_level = pipeline::load_project(&global)
        .ok()
        .map(|(_, config)| config.logging.level);
    logging::init(&global, configured_level.as_deref());

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Graph(ref args) => graph::run(args, &global),
        Command::Cache(ref cmd) => cache::run(cmd, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
