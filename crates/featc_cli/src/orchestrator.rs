//! Build orchestration: registry → graph → cycle check → order → cached compile.
//!
//! Modules are compiled dependencies first. Each module is fingerprinted and
//! looked up in the cache; only misses reach the [`Transformer`]. A module
//! whose transformation fails takes all of its transitive dependents down
//! with it, while unrelated modules still build.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use featc_cache::{Cache, CacheEntry, CacheError, CachedOutput, EntryMetadata, IdentityFilter};
use featc_common::{now_millis, ContentHash};
use featc_graph::{
    detect_cycles, resolve_order, Cycle, DependencyGraph, GraphError, ModuleRegistry,
};
use crate::pipeline::SourceUnit;
use crate::transform::{DependencyContext, TransformRequest, Transformer};

/// Per-build inputs that feed every fingerprint and request.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Rules file contents (empty when none is configured).
    pub rules: String,
    /// Tool version.
    pub tool_version: String,
    /// Target identifier.
    pub target: String,
    /// Configured model identifier.
    pub model: String,
    /// Directory generated files are written to.
    pub output_dir: PathBuf,
    /// Extension of generated files, without the dot.
    pub extension: String,
    /// Ignore cached results (fresh results are still stored).
    pub force: bool,
}

/// A module whose transformation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedModule {
    /// Module name.
    pub name: String,
    /// Transformer error message.
    pub reason: String,
}

/// What happened to each module during a build.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    /// Modules produced by the transformer, in build order.
    pub compiled: Vec<String>,
    /// Modules served from the cache, in build order.
    pub cached: Vec<String>,
    /// Modules whose transformation failed.
    pub failed: Vec<FailedModule>,
    /// Modules not attempted because a dependency failed.
    pub skipped: Vec<String>,
    /// Cache entries dropped because the rules, tool version or target changed.
    pub invalidated: usize,
    /// Cache entries evicted to honor the size budget.
    pub evicted: usize,
}

impl BuildSummary {
    /// Returns `true` if every module was built or served from cache.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Result of a build that got past validation.
#[derive(Debug)]
pub enum BuildOutcome {
    /// The build ran; see the summary for per-module results.
    Built(BuildSummary),
    /// The graph has cycles. Nothing was compiled.
    Cycles(Vec<Cycle>),
}

/// Errors that abort a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Duplicate module or unknown dependency.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The cache could not be updated.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A generated file could not be written.
    #[error("failed to write {path}: {source}")]
    Output {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Drives one build over a set of scanned feature files.
pub struct Orchestrator<'a> {
    settings: BuildSettings,
    transformer: &'a dyn Transformer,
    cache: Option<Cache>,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator. Pass `None` for `cache` to bypass caching.
    pub fn new(settings: BuildSettings, transformer: &'a dyn Transformer, cache: Option<Cache>) -> Self {
        Self {
            settings,
            transformer,
            cache,
        }
    }

    /// Runs the build.
    pub fn run(&mut self, units: &[SourceUnit]) -> Result<BuildOutcome, BuildError> {
        let registry = ModuleRegistry::from_parsed(units.iter().map(|u| u.parsed.clone()))?;
        let graph = DependencyGraph::build(&registry)?;
        tracing::debug!(modules = graph.len(), "dependency graph built");

        let cycles = detect_cycles(&graph);
        if !cycles.is_empty() {
            for cycle in &cycles {
                tracing::error!("{}", cycle.message);
            }
            return Ok(BuildOutcome::Cycles(cycles));
        }

        let texts: BTreeMap<&str, &str> = units
            .iter()
            .filter(|u| u.parsed.is_clean())
            .map(|u| (u.parsed.descriptor.name.as_str(), u.text.as_str()))
            .collect();

        let rules_hash = ContentHash::from_bytes(self.settings.rules.as_bytes());
        let mut summary = BuildSummary::default();

        if let Some(cache) = self.cache.as_mut() {
            let filter = IdentityFilter {
                rules_hash: Some(rules_hash.clone()),
                tool_version: Some(self.settings.tool_version.clone()),
                target: Some(self.settings.target.clone()),
                ..IdentityFilter::default()
            };
            summary.invalidated = cache.invalidate_matching(&filter)?.len();
        }

        let mut blocked: BTreeSet<String> = BTreeSet::new();

        // The resolved order lists dependents first; walk it backwards.
        for name in resolve_order(&graph).iter().rev() {
            if blocked.contains(name) {
                tracing::warn!(module = %name, "skipped: a dependency failed to build");
                summary.skipped.push(name.clone());
                continue;
            }
            let Some(&source) = texts.get(name.as_str()) else {
                continue;
            };

            let key = Cache::fingerprint(
                source,
                &self.settings.rules,
                &self.settings.tool_version,
                &self.settings.target,
            );

            let hit = match self.cache.as_mut() {
                Some(cache) if !self.settings.force => match cache.get(&key) {
                    Ok(hit) => hit,
                    Err(e) => {
                        tracing::warn!(module = %name, error = %e, "cache lookup failed; recompiling");
                        None
                    }
                },
                _ => None,
            };
            if let Some(entry) = hit {
                tracing::debug!(module = %name, "served from cache");
                self.write_outputs(name, &entry.payload)?;
                summary.cached.push(name.clone());
                continue;
            }

            let dependencies = graph
                .dependencies_of(name)
                .map(|dep| DependencyContext {
                    name: dep.to_string(),
                    exports: registry
                        .lookup(dep)
                        .map(|d| d.exports.clone())
                        .unwrap_or_default(),
                })
                .collect();
            let request = TransformRequest {
                module: name,
                source,
                rules: &self.settings.rules,
                target: &self.settings.target,
                model: &self.settings.model,
                dependencies,
            };

            let started = Instant::now();
            match self.transformer.transform(&request) {
                Ok(response) => {
                    let payload = CachedOutput {
                        code: response.code,
                        tests: response.tests,
                    };
                    self.write_outputs(name, &payload)?;
                    tracing::info!(module = %name, "compiled");

                    if let Some(cache) = self.cache.as_mut() {
                        let entry = CacheEntry::new(
                            ContentHash::from_bytes(source.as_bytes()),
                            rules_hash.clone(),
                            payload,
                            EntryMetadata {
                                created_at_ms: now_millis(),
                                duration_ms: started.elapsed().as_millis() as u64,
                                model: response
                                    .model
                                    .unwrap_or_else(|| self.settings.model.clone()),
                                tool_version: self.settings.tool_version.clone(),
                                target: self.settings.target.clone(),
                            },
                        );
                        cache.set(&key, &entry)?;
                    }
                    summary.compiled.push(name.clone());
                }
                Err(e) => {
                    tracing::error!(module = %name, "transformation failed: {e}");
                    blocked.extend(graph.transitive_dependents(name));
                    summary.failed.push(FailedModule {
                        name: name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(cache) = self.cache.as_mut() {
            let budget = cache.max_size();
            let report = cache.evict(budget)?;
            summary.evicted = report.removed.len();
        }

        Ok(BuildOutcome::Built(summary))
    }

    /// Writes `<name>.<ext>` and, when present, `<name>.tests.<ext>`.
    fn write_outputs(&self, name: &str, output: &CachedOutput) -> Result<(), BuildError> {
        let dir = &self.settings.output_dir;
        std::fs::create_dir_all(dir).map_err(|source| BuildError::Output {
            path: dir.clone(),
            source,
        })?;
        let ext = &self.settings.extension;
        write_file(&dir.join(format!("{name}.{ext}")), &output.code)?;
        if let Some(tests) = &output.tests {
            write_file(&dir.join(format!("{name}.tests.{ext}")), tests)?;
        }
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), BuildError> {
    std::fs::write(path, contents).map_err(|source| BuildError::Output {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::scan_header;
    use crate::transform::{TransformError, TransformResponse};
    use std::cell::RefCell;

    /// Records calls and fails on request for selected modules.
    #[derive(Default)]
    struct FakeTransformer {
        calls: RefCell<Vec<String>>,
        failing: BTreeSet<String>,
        with_tests: bool,
    }

    impl FakeTransformer {
        fn failing(names: &[&str]) -> Self {
            Self {
                failing: names.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl Transformer for FakeTransformer {
        fn transform(
            &self,
            request: &TransformRequest<'_>,
        ) -> Result<TransformResponse, TransformError> {
            self.calls.borrow_mut().push(request.module.to_string());
            if self.failing.contains(request.module) {
                return Err(TransformError::InvalidResponse("refused".to_string()));
            }
            let deps: Vec<&str> = request.dependencies.iter().map(|d| d.name.as_str()).collect();
            Ok(TransformResponse {
                code: format!("# {} uses [{}]", request.module, deps.join(",")),
                tests: self.with_tests.then(|| format!("# tests for {}", request.module)),
                model: None,
            })
        }
    }

    fn unit(file: &str, text: &str) -> SourceUnit {
        SourceUnit {
            parsed: scan_header(Path::new(file), text),
            text: text.to_string(),
        }
    }

    fn calculator() -> Vec<SourceUnit> {
        vec![
            unit("math.feature", "Feature: Mathematics\nDepends: Utils\n"),
            unit("utils.feature", "Feature: Utils\nExports: clamp\n"),
        ]
    }

    fn settings(out: &Path, rules: &str) -> BuildSettings {
        BuildSettings {
            rules: rules.to_string(),
            tool_version: "0.1.0".to_string(),
            target: "python".to_string(),
            model: "default".to_string(),
            output_dir: out.to_path_buf(),
            extension: "py".to_string(),
            force: false,
        }
    }

    fn built(outcome: BuildOutcome) -> BuildSummary {
        match outcome {
            BuildOutcome::Built(summary) => summary,
            BuildOutcome::Cycles(c) => panic!("unexpected cycles: {c:?}"),
        }
    }

    #[test]
    fn compiles_dependencies_first_and_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("generated");
        let fake = FakeTransformer::default();
        let cache = Cache::new(&dir.path().join("cache"), 1 << 20);

        let summary = built(
            Orchestrator::new(settings(&out, ""), &fake, Some(cache))
                .run(&calculator())
                .unwrap(),
        );

        assert_eq!(fake.calls(), vec!["Utils", "Mathematics"]);
        assert_eq!(summary.compiled, vec!["Utils", "Mathematics"]);
        assert!(summary.is_success());
        let math = std::fs::read_to_string(out.join("Mathematics.py")).unwrap();
        assert_eq!(math, "# Mathematics uses [Utils]");
        assert!(!out.join("Mathematics.tests.py").exists());
    }

    #[test]
    fn second_build_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("generated");
        let cache_dir = dir.path().join("cache");

        let first = FakeTransformer::default();
        built(
            Orchestrator::new(settings(&out, ""), &first, Some(Cache::new(&cache_dir, 1 << 20)))
                .run(&calculator())
                .unwrap(),
        );
        std::fs::remove_dir_all(&out).unwrap();

        let second = FakeTransformer::default();
        let summary = built(
            Orchestrator::new(settings(&out, ""), &second, Some(Cache::new(&cache_dir, 1 << 20)))
                .run(&calculator())
                .unwrap(),
        );

        assert!(second.calls().is_empty());
        assert_eq!(summary.cached, vec!["Utils", "Mathematics"]);
        assert!(out.join("Utils.py").exists());
    }

    #[test]
    fn unsaveable_manifest_does_not_abort_cached_build() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("generated");
        let cache_dir = dir.path().join("cache");

        let first = FakeTransformer::default();
        built(
            Orchestrator::new(settings(&out, ""), &first, Some(Cache::new(&cache_dir, 1 << 20)))
                .run(&calculator())
                .unwrap(),
        );

        let mut cache = Cache::new(&cache_dir, 1 << 20);
        assert_eq!(cache.stats().entries, 2);
        let manifest = cache_dir.join("manifest.json");
        std::fs::remove_file(&manifest).unwrap();
        std::fs::create_dir(&manifest).unwrap();

        let second = FakeTransformer::default();
        let summary = built(
            Orchestrator::new(settings(&out, ""), &second, Some(cache))
                .run(&calculator())
                .unwrap(),
        );
        assert!(summary.is_success());
        assert!(second.calls().is_empty());
        assert_eq!(summary.cached, vec!["Utils", "Mathematics"]);
    }

    #[test]
    fn source_edit_recompiles_only_that_module() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("generated");
        let cache_dir = dir.path().join("cache");

        let fake = FakeTransformer::default();
        built(
            Orchestrator::new(settings(&out, ""), &fake, Some(Cache::new(&cache_dir, 1 << 20)))
                .run(&calculator())
                .unwrap(),
        );

        let mut edited = calculator();
        edited[1] = unit("utils.feature", "Feature: Utils\nExports: clamp, lerp\n");
        let fake = FakeTransformer::default();
        let summary = built(
            Orchestrator::new(settings(&out, ""), &fake, Some(Cache::new(&cache_dir, 1 << 20)))
                .run(&edited)
                .unwrap(),
        );
        assert_eq!(summary.compiled, vec!["Utils"]);
        assert_eq!(summary.cached, vec!["Mathematics"]);
    }

    #[test]
    fn rules_change_invalidates_everything() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("generated");
        let cache_dir = dir.path().join("cache");

        let fake = FakeTransformer::default();
        built(
            Orchestrator::new(settings(&out, "v1"), &fake, Some(Cache::new(&cache_dir, 1 << 20)))
                .run(&calculator())
                .unwrap(),
        );

        let fake = FakeTransformer::default();
        let summary = built(
            Orchestrator::new(settings(&out, "v2"), &fake, Some(Cache::new(&cache_dir, 1 << 20)))
                .run(&calculator())
                .unwrap(),
        );
        assert_eq!(summary.invalidated, 2);
        assert_eq!(summary.compiled.len(), 2);
        assert_eq!(Cache::new(&cache_dir, 1 << 20).stats().entries, 2);
    }

    #[test]
    fn cycle_aborts_before_transforming() {
        let dir = tempfile::tempdir().unwrap();
        let units = vec![
            unit("a.feature", "Feature: A\nDepends: B\n"),
            unit("b.feature", "Feature: B\nDepends: A\n"),
        ];
        let fake = FakeTransformer::default();
        let outcome = Orchestrator::new(settings(dir.path(), ""), &fake, None)
            .run(&units)
            .unwrap();

        match outcome {
            BuildOutcome::Cycles(cycles) => {
                assert_eq!(cycles.len(), 1);
                assert!(cycles[0].message.starts_with("Circular dependency detected: "));
            }
            BuildOutcome::Built(_) => panic!("expected cycles"),
        }
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn failure_skips_transitive_dependents_only() {
        let dir = tempfile::tempdir().unwrap();
        let units = vec![
            unit("utils.feature", "Feature: Utils\n"),
            unit("math.feature", "Feature: Mathematics\nDepends: Utils\n"),
            unit("stats.feature", "Feature: Statistics\nDepends: Mathematics\n"),
            unit("strings.feature", "Feature: Strings\n"),
        ];
        let fake = FakeTransformer::failing(&["Utils"]);
        let summary = built(
            Orchestrator::new(settings(dir.path(), ""), &fake, None)
                .run(&units)
                .unwrap(),
        );

        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].name, "Utils");
        assert_eq!(summary.failed[0].reason, "invalid transformer response: refused");
        let mut skipped = summary.skipped.clone();
        skipped.sort();
        assert_eq!(skipped, vec!["Mathematics", "Statistics"]);
        assert_eq!(summary.compiled, vec!["Strings"]);
        assert!(!summary.is_success());
    }

    #[test]
    fn unknown_dependency_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let units = vec![unit("a.feature", "Feature: A\nDepends: Missing\n")];
        let fake = FakeTransformer::default();
        let err = Orchestrator::new(settings(dir.path(), ""), &fake, None)
            .run(&units)
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Graph(GraphError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn structurally_broken_files_are_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let units = vec![
            unit("ok.feature", "Feature: Ok\n"),
            unit("broken.feature", "Scenario: no header\n"),
        ];
        let fake = FakeTransformer::default();
        let summary = built(
            Orchestrator::new(settings(dir.path(), ""), &fake, None)
                .run(&units)
                .unwrap(),
        );
        assert_eq!(summary.compiled, vec!["Ok"]);
    }

    #[test]
    fn force_bypasses_hits_but_refreshes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("generated");
        let cache_dir = dir.path().join("cache");

        let fake = FakeTransformer::default();
        built(
            Orchestrator::new(settings(&out, ""), &fake, Some(Cache::new(&cache_dir, 1 << 20)))
                .run(&calculator())
                .unwrap(),
        );

        let mut forced = settings(&out, "");
        forced.force = true;
        let fake = FakeTransformer::default();
        let summary = built(
            Orchestrator::new(forced, &fake, Some(Cache::new(&cache_dir, 1 << 20)))
                .run(&calculator())
                .unwrap(),
        );
        assert_eq!(fake.calls().len(), 2);
        assert!(summary.cached.is_empty());
        assert_eq!(Cache::new(&cache_dir, 1 << 20).stats().entries, 2);
    }

    #[test]
    fn generated_tests_get_their_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeTransformer {
            with_tests: true,
            ..FakeTransformer::default()
        };
        built(
            Orchestrator::new(settings(dir.path(), ""), &fake, None)
                .run(&calculator())
                .unwrap(),
        );
        let tests = std::fs::read_to_string(dir.path().join("Utils.tests.py")).unwrap();
        assert_eq!(tests, "# tests for Utils");
    }

    #[test]
    fn tiny_budget_evicts_after_build() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeTransformer::default();
        let summary = built(
            Orchestrator::new(
                settings(&dir.path().join("out"), ""),
                &fake,
                Some(Cache::new(&dir.path().join("cache"), 1)),
            )
            .run(&calculator())
            .unwrap(),
        );
        assert_eq!(summary.compiled.len(), 2);
        assert_eq!(summary.evicted, 2);
    }
}
