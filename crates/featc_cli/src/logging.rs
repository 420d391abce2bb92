//! Tracing subscriber setup.
//!
//! `--verbose` and `--quiet` win over the configured `[logging] level`.
//! `RUST_LOG`, when set, is merged on top.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::GlobalArgs;

/// Installs the global subscriber, writing to stderr.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(global: &GlobalArgs, configured: Option<&str>) {
    let directives = base_directives(global, configured);
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = env_filter(&directives, rust_log.as_deref());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Picks the directive string from CLI flags and the configured level.
pub fn base_directives(global: &GlobalArgs, configured: Option<&str>) -> String {
    if global.verbose {
        return "debug".to_string();
    }
    if global.quiet {
        return "error".to_string();
    }
    normalize_level(configured.unwrap_or("info"))
}

fn normalize_level(input: &str) -> String {
    let trimmed = input.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" => "info".to_string(),
        "trace" => "trace".to_string(),
        "debug" => "debug".to_string(),
        "info" => "info".to_string(),
        "warn" | "warning" => "warn".to_string(),
        "error" => "error".to_string(),
        // Anything else is an `EnvFilter` directive string.
        _ => trimmed.to_string(),
    }
}

/// Builds the filter, merging `RUST_LOG` directives after the base ones.
///
/// Falls back to `info` when neither parses.
pub fn env_filter(base: &str, rust_log: Option<&str>) -> EnvFilter {
    let env = rust_log.map(str::trim).filter(|v| !v.is_empty());
    let combined = match env {
        Some(env) => EnvFilter::try_new(format!("{base},{env}"))
            .or_else(|_| EnvFilter::try_new(env))
            .or_else(|_| EnvFilter::try_new(base)),
        None => EnvFilter::try_new(base),
    };
    combined.unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::INFO.into()))
}
