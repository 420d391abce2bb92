//! `featc cache` — inspect and maintain the compilation cache.

use featc_cache::{Cache, CacheStats};
use featc_common::{ByteSize, Fingerprint};

use crate::build::open_cache;
use crate::pipeline::load_project;
use crate::{CacheCommand, GlobalArgs, ReportFormat};

/// Runs a `featc cache` subcommand.
pub fn run(command: &CacheCommand, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (project_dir, config) = load_project(global)?;
    let mut cache = open_cache(&project_dir, &config)?;

    match command {
        CacheCommand::Stats { format } => {
            let stats = cache.stats();
            match format {
                ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                ReportFormat::Text => print_stats(&stats, &cache),
            }
        }
        CacheCommand::Clear { key } => {
            let key = key.as_deref().map(str::parse::<Fingerprint>).transpose()?;
            cache.clear(key.as_ref())?;
            if !global.quiet {
                match key {
                    Some(key) => eprintln!("   Removed {key}"),
                    None => eprintln!("   Cleared {}", cache.cache_dir().display()),
                }
            }
        }
        CacheCommand::Evict { max_size } => {
            let budget = match max_size {
                Some(size) => size.parse::<ByteSize>()?.bytes(),
                None => cache.max_size(),
            };
            let report = cache.evict(budget)?;
            if !global.quiet {
                eprintln!(
                    "   Evicted {} entries, freed {}",
                    report.removed.len(),
                    ByteSize::new(report.freed_bytes)
                );
            }
        }
    }
    Ok(0)
}

fn print_stats(stats: &CacheStats, cache: &Cache) {
    println!("location:  {}", cache.cache_dir().display());
    println!("entries:   {}", stats.entries);
    println!(
        "size:      {} / {}",
        ByteSize::new(stats.total_size),
        ByteSize::new(stats.max_size)
    );
}
