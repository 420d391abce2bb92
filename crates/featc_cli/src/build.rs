//! `featc build` — compile every feature file in the project.
//!
//! 1. Find project root and load `featc.toml`
//! 2. Scan feature file headers under the source directory
//! 3. Hand everything to the [`Orchestrator`]
//! 4. Report per-module results

use std::path::Path;

use featc_cache::Cache;
use featc_config::ProjectConfig;

use crate::orchestrator::{BuildOutcome, BuildSettings, BuildSummary, Orchestrator};
use crate::pipeline::{load_project, load_sources};
use crate::transform::CommandTransformer;
use crate::{BuildArgs, GlobalArgs};

/// Runs the `featc build` command.
///
/// Returns exit code 0 when every module built, 1 otherwise.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (project_dir, config) = load_project(global)?;

    if !global.quiet {
        eprintln!(
            "   Building {} v{} (target {})",
            config.project.name, config.project.version, config.compiler.target
        );
    }

    let units = load_sources(&project_dir, &config)?;
    if units.is_empty() {
        eprintln!(
            "error: no .feature files found in {}",
            project_dir.join(&config.build.source_dir).display()
        );
        return Ok(1);
    }

    let transformer = CommandTransformer::from_command(&config.compiler.command)?;
    let settings = build_settings(&project_dir, &config, args.force)?;
    let cache = if args.no_cache || !config.cache.enabled {
        tracing::debug!("cache disabled for this build");
        None
    } else {
        Some(open_cache(&project_dir, &config)?)
    };

    let outcome = Orchestrator::new(settings, &transformer, cache).run(&units)?;
    match outcome {
        BuildOutcome::Cycles(cycles) => {
            for cycle in &cycles {
                eprintln!("error: {}", cycle.message);
            }
            Ok(1)
        }
        BuildOutcome::Built(summary) => {
            if !global.quiet {
                report(&summary, &project_dir.join(&config.build.output_dir));
            }
            for failed in &summary.failed {
                eprintln!("error: {} failed: {}", failed.name, failed.reason);
            }
            Ok(if summary.is_success() { 0 } else { 1 })
        }
    }
}

/// Gathers the fingerprint inputs from the configuration.
pub fn build_settings(
    project_dir: &Path,
    config: &ProjectConfig,
    force: bool,
) -> Result<BuildSettings, Box<dyn std::error::Error>> {
    let rules = match &config.build.rules {
        Some(file) => {
            let path = project_dir.join(file);
            std::fs::read_to_string(&path)
                .map_err(|e| format!("cannot read rules file {}: {e}", path.display()))?
        }
        None => String::new(),
    };
    Ok(BuildSettings {
        rules,
        tool_version: config.compiler.tool_version.clone(),
        target: config.compiler.target.clone(),
        model: config.compiler.model.clone(),
        output_dir: project_dir.join(&config.build.output_dir),
        extension: config.compiler.output_extension().to_string(),
        force,
    })
}

/// Opens the project's cache with its configured budget.
pub fn open_cache(
    project_dir: &Path,
    config: &ProjectConfig,
) -> Result<Cache, Box<dyn std::error::Error>> {
    let max_size = config.cache.max_size_bytes()?;
    Ok(Cache::new(&project_dir.join(&config.cache.dir), max_size.bytes()))
}

fn report(summary: &BuildSummary, output_dir: &Path) {
    for name in &summary.cached {
        eprintln!("      Fresh {name}");
    }
    for name in &summary.compiled {
        eprintln!("  Compiled {name}");
    }
    for name in &summary.skipped {
        eprintln!("   Skipped {name} (dependency failed)");
    }
    if summary.invalidated > 0 {
        eprintln!("   Invalidated {} stale cache entries", summary.invalidated);
    }
    if summary.evicted > 0 {
        eprintln!("   Evicted {} cache entries", summary.evicted);
    }
    eprintln!(
        "   Finished {} compiled, {} cached, {} failed -> {}",
        summary.compiled.len(),
        summary.cached.len(),
        summary.failed.len(),
        output_dir.display()
    );
}
