//! Shared pipeline helpers for CLI commands.
//!
//! Contains project root resolution, feature file discovery and the header
//! scanner that turns a feature file into a [`ParsedModule`].

use std::path::{Path, PathBuf};

use featc_common::is_valid_module_name;
use featc_config::{ProjectConfig, CONFIG_FILE};
use featc_graph::{ModuleDescriptor, ParsedModule};

use crate::GlobalArgs;

/// File extension of feature files.
const FEATURE_EXT: &str = "feature";

/// A feature file's parsed header together with its full text.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// Header scan result.
    pub parsed: ParsedModule,
    /// The complete file contents, fingerprinted and sent to the transformer.
    pub text: String,
}

/// Walks up from `start` looking for the nearest directory containing `featc.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from the current directory looking for `featc.toml`.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

/// Resolves the project root and loads its configuration.
pub fn load_project(
    global: &GlobalArgs,
) -> Result<(PathBuf, ProjectConfig), Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let config = match global.config.as_deref().map(Path::new) {
        Some(file) if file.is_file() => featc_config::load_config_file(file)?,
        _ => featc_config::load_config(&project_dir)?,
    };
    Ok((project_dir, config))
}

/// Discovers `.feature` files in the given directory (recursive), sorted by path.
pub fn discover_feature_files(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    walk_dir(dir, &mut files)?;
    files.sort();
    Ok(files)
}

/// Recursively walks a directory collecting feature files. Symlinked
/// directories are not followed.
fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            walk_dir(&path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(FEATURE_EXT) {
            files.push(path);
        }
    }
    Ok(())
}

/// Reads and scans every feature file under the project's source directory.
pub fn load_sources(
    project_dir: &Path,
    config: &ProjectConfig,
) -> Result<Vec<SourceUnit>, Box<dyn std::error::Error>> {
    let src_dir = project_dir.join(&config.build.source_dir);
    if !src_dir.is_dir() {
        return Err(format!("source directory {} does not exist", src_dir.display()).into());
    }
    let mut units = Vec::new();
    for path in discover_feature_files(&src_dir)? {
        let text = std::fs::read_to_string(&path)?;
        let parsed = scan_header(&path, &text);
        for err in &parsed.errors {
            tracing::warn!(file = %path.display(), "{err}; module excluded from build");
        }
        units.push(SourceUnit { parsed, text });
    }
    tracing::debug!(files = units.len(), dir = %src_dir.display(), "scanned feature files");
    Ok(units)
}

/// Scans a feature file's structural header.
///
/// Recognizes `Feature: <Name>`, `Depends: A, B` (or `Uses:`) and
/// `Exports: x, y` lines. The body is left to the transformer.
pub fn scan_header(path: &Path, text: &str) -> ParsedModule {
    let mut name: Option<String> = None;
    let mut dependencies = Vec::new();
    let mut exports = Vec::new();
    let mut errors = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        let lineno = idx + 1;
        if let Some(rest) = line.strip_prefix("Feature:") {
            let candidate = rest.trim();
            if name.is_some() {
                errors.push(format!("line {lineno}: duplicate Feature: header"));
            } else if !is_valid_module_name(candidate) {
                errors.push(format!(
                    "line {lineno}: invalid module name '{candidate}' (letters and underscores only)"
                ));
                name = Some(candidate.to_string());
            } else {
                name = Some(candidate.to_string());
            }
        } else if let Some(rest) = line
            .strip_prefix("Depends:")
            .or_else(|| line.strip_prefix("Uses:"))
        {
            for dep in split_list(rest) {
                if is_valid_module_name(dep) {
                    dependencies.push(dep.to_string());
                } else {
                    errors.push(format!("line {lineno}: invalid dependency name '{dep}'"));
                }
            }
        } else if let Some(rest) = line.strip_prefix("Exports:") {
            exports.extend(split_list(rest).map(str::to_string));
        }
    }

    let name = name.unwrap_or_else(|| {
        errors.push("missing Feature: header".to_string());
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    });

    ParsedModule {
        descriptor: ModuleDescriptor::new(name, path, dependencies, exports),
        errors,
    }
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(',').map(str::trim).filter(|s| !s.is_empty())
}
