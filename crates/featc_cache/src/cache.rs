//! High-level cache interface.
//!
//! The [`Cache`] type ties together the manifest and the entry store. The
//! manifest is loaded lazily on the first operation and saved after every
//! mutation. All reads are fail-safe: a missing or corrupt entry is a miss.

use std::path::{Path, PathBuf};

use featc_common::{ByteSize, ContentHash, Fingerprint};
use serde::Serialize;

use crate::entry::{CacheEntry, EntryStore};
use crate::error::{CacheError, CacheOperation};
use crate::manifest::Manifest;

/// Expected identity of cache entries, used by invalidation.
///
/// A component set to `None` matches any stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityFilter {
    /// Expected source hash.
    pub source_hash: Option<ContentHash>,
    /// Expected rules hash.
    pub rules_hash: Option<ContentHash>,
    /// Expected tool version.
    pub tool_version: Option<String>,
    /// Expected target identifier.
    pub target: Option<String>,
}

impl IdentityFilter {
    /// A filter that requires all four components to match.
    pub fn exact(
        source_hash: &ContentHash,
        rules_hash: &ContentHash,
        tool_version: &str,
        target: &str,
    ) -> Self {
        Self {
            source_hash: Some(source_hash.clone()),
            rules_hash: Some(rules_hash.clone()),
            tool_version: Some(tool_version.to_string()),
            target: Some(target.to_string()),
        }
    }

    /// Returns `true` if the entry agrees with every component that is set.
    pub fn matches(&self, entry: &CacheEntry) -> bool {
        self.source_hash
            .as_ref()
            .map_or(true, |h| *h == entry.source_hash)
            && self
                .rules_hash
                .as_ref()
                .map_or(true, |h| *h == entry.rules_hash)
            && self
                .tool_version
                .as_deref()
                .map_or(true, |v| v == entry.metadata.tool_version)
            && self
                .target
                .as_deref()
                .map_or(true, |t| t == entry.metadata.target)
    }
}

/// Snapshot of cache usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of entries in the manifest.
    pub entries: usize,
    /// Total size of all entries, in bytes.
    pub total_size: u64,
    /// Configured maximum size, in bytes.
    pub max_size: u64,
    /// Hits recorded by this instance.
    pub hits: u64,
    /// Misses recorded by this instance.
    pub misses: u64,
    /// `hits / (hits + misses)`, or 0 before any lookup.
    pub hit_rate: f64,
}

/// Outcome of an eviction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvictionReport {
    /// Keys removed, oldest first.
    pub removed: Vec<String>,
    /// Bytes subtracted from the manifest total.
    pub freed_bytes: u64,
}

/// Content-addressed cache of compilation results.
///
/// Designed for a single owning process; nothing here guards the cache
/// directory against concurrent writers.
pub struct Cache {
    /// Root directory for all cache files.
    cache_dir: PathBuf,
    /// Configured size budget, in bytes.
    max_size: u64,
    /// In-memory mirror of `manifest.json`, loaded on first use.
    manifest: Option<Manifest>,
    /// Entry file storage.
    store: EntryStore,
    /// Last access timestamp handed out. Strictly increasing.
    clock: u64,
    hits: u64,
    misses: u64,
}

impl Cache {
    /// Creates a cache rooted at `cache_dir` with a byte budget.
    ///
    /// Nothing is read from disk until the first operation.
    pub fn new(cache_dir: &Path, max_size: u64) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            max_size,
            manifest: None,
            store: EntryStore::new(cache_dir),
            clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Creates a cache with a budget given as a size string such as `"100MB"`.
    pub fn with_max_size(cache_dir: &Path, max_size: &str) -> Result<Self, CacheError> {
        let size: ByteSize = max_size.parse()?;
        Ok(Self::new(cache_dir, size.bytes()))
    }

    /// Computes the fingerprint for a module compilation.
    pub fn fingerprint(source: &str, rules: &str, tool_version: &str, target: &str) -> Fingerprint {
        Fingerprint::compute(source, rules, tool_version, target)
    }

    /// Returns the cache root directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the configured size budget, in bytes.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Looks up an entry.
    ///
    /// Returns `Ok(None)` and records a miss when the key is unknown, when its
    /// backing file has disappeared (the stale record is dropped), or when the
    /// file fails validation (the entry is cleared). On a hit the entry's access
    /// time is refreshed and saved; failing to save it is logged and the hit
    /// is still returned.
    pub fn get(&mut self, key: &Fingerprint) -> Result<Option<CacheEntry>, CacheError> {
        let Some(file) = self.manifest_mut().get(key.as_str()).map(|e| e.file.clone()) else {
            tracing::debug!(key = %key, "cache miss");
            self.misses += 1;
            return Ok(None);
        };

        if !self.store.exists(&file) {
            tracing::warn!(key = %key, "cache entry file missing; dropping manifest record");
            self.manifest_mut().remove(key.as_str());
            self.persist_absorbing(key);
            self.misses += 1;
            return Ok(None);
        }

        let Some(entry) = self.store.read(&file) else {
            tracing::warn!(key = %key, "cache entry failed validation; clearing");
            if let Err(e) = self.store.remove(&file) {
                tracing::warn!(key = %key, error = %e, "could not delete invalid cache entry");
            }
            self.manifest_mut().remove(key.as_str());
            self.persist_absorbing(key);
            self.misses += 1;
            return Ok(None);
        };

        let now = self.tick();
        if let Some(record) = self.manifest_mut().get_mut(key.as_str()) {
            record.last_accessed_ms = now;
        }
        self.persist_absorbing(key);
        tracing::debug!(key = %key, "cache hit");
        self.hits += 1;
        Ok(Some(entry))
    }

    /// Stores an entry under `key`, replacing any previous one.
    ///
    /// Does not evict; call [`Cache::evict`] to reclaim space.
    pub fn set(&mut self, key: &Fingerprint, entry: &CacheEntry) -> Result<(), CacheError> {
        let wrap = |e: CacheError| e.during(CacheOperation::Set, Some(key.as_str()));
        self.manifest_mut();
        let file = EntryStore::file_name(key.as_str());
        let size = self.store.write(&file, entry).map_err(wrap)?;
        let now = self.tick();
        self.manifest_mut().upsert(key.as_str(), file, size, now);
        self.persist().map_err(wrap)?;
        tracing::debug!(key = %key, size, "cache entry stored");
        Ok(())
    }

    /// Returns `true` if `key` would be a hit, without touching access times or
    /// hit/miss counters.
    pub fn is_valid(&mut self, key: &Fingerprint) -> bool {
        let Some(file) = self.manifest_mut().get(key.as_str()).map(|e| e.file.clone()) else {
            return false;
        };
        self.store.exists(&file) && self.store.read(&file).is_some()
    }

    /// Removes least-recently-accessed entries until the total size is at most
    /// `max_bytes` or the cache is empty.
    ///
    /// Deleting an individual entry file is best-effort; its manifest record is
    /// removed regardless. Failing to save the manifest is an error.
    pub fn evict(&mut self, max_bytes: u64) -> Result<EvictionReport, CacheError> {
        let manifest = self.manifest_mut();
        let mut by_age = manifest.entries.clone();
        by_age.sort_by_key(|e| e.last_accessed_ms);

        let mut report = EvictionReport::default();
        let mut files = Vec::new();
        let mut victims = by_age.into_iter();
        while manifest.total_size > max_bytes {
            let Some(victim) = victims.next() else {
                break;
            };
            manifest.remove(&victim.key);
            report.freed_bytes += victim.size;
            report.removed.push(victim.key);
            files.push(victim.file);
        }

        for (key, file) in report.removed.iter().zip(&files) {
            if let Err(e) = self.store.remove(file) {
                tracing::warn!(key = %key, error = %e, "could not delete evicted cache entry");
            }
        }

        if !report.removed.is_empty() {
            self.persist()
                .map_err(|e| e.during(CacheOperation::Evict, None))?;
            tracing::info!(
                removed = report.removed.len(),
                freed_bytes = report.freed_bytes,
                "evicted cache entries"
            );
        }
        Ok(report)
    }

    /// Removes every entry whose stored identity differs from the given one,
    /// or that cannot be read at all. Returns the removed keys.
    pub fn invalidate(
        &mut self,
        source_hash: &ContentHash,
        rules_hash: &ContentHash,
        tool_version: &str,
        target: &str,
    ) -> Result<Vec<String>, CacheError> {
        self.invalidate_matching(&IdentityFilter::exact(
            source_hash,
            rules_hash,
            tool_version,
            target,
        ))
    }

    /// Removes every entry that does not satisfy `filter`, or that cannot be
    /// read at all. Returns the removed keys.
    ///
    /// As with [`Cache::evict`], deleting an entry file is best-effort and the
    /// manifest is saved even when some deletions fail.
    pub fn invalidate_matching(
        &mut self,
        filter: &IdentityFilter,
    ) -> Result<Vec<String>, CacheError> {
        let records = self.manifest_mut().entries.clone();
        let stale: Vec<String> = records
            .into_iter()
            .filter(|record| match self.store.read(&record.file) {
                Some(entry) => !filter.matches(&entry),
                None => true,
            })
            .map(|record| record.key)
            .collect();

        if stale.is_empty() {
            return Ok(stale);
        }

        for key in &stale {
            if let Some(record) = self.manifest_mut().remove(key) {
                if let Err(e) = self.store.remove(&record.file) {
                    tracing::warn!(key = %key, error = %e, "could not delete invalidated cache entry");
                }
            }
        }
        self.persist()
            .map_err(|e| e.during(CacheOperation::Invalidate, None))?;
        tracing::info!(removed = stale.len(), "invalidated stale cache entries");
        Ok(stale)
    }

    /// Removes one entry, or every entry when `key` is `None`.
    pub fn clear(&mut self, key: Option<&Fingerprint>) -> Result<(), CacheError> {
        match key {
            Some(key) => {
                let wrap = |e: CacheError| e.during(CacheOperation::Clear, Some(key.as_str()));
                let file = self
                    .manifest_mut()
                    .remove(key.as_str())
                    .map(|r| r.file)
                    .unwrap_or_else(|| EntryStore::file_name(key.as_str()));
                self.store.remove(&file).map_err(wrap)?;
                self.persist().map_err(wrap)?;
            }
            None => {
                let wrap = |e: CacheError| e.during(CacheOperation::Clear, None);
                self.store.remove_all().map_err(wrap)?;
                self.manifest_mut().clear();
                self.persist().map_err(wrap)?;
                tracing::info!(cache_dir = %self.cache_dir.display(), "cache cleared");
            }
        }
        Ok(())
    }

    /// Returns current usage and lifetime hit/miss counts.
    pub fn stats(&mut self) -> CacheStats {
        let (entries, total_size) = {
            let m = self.manifest_mut();
            (m.len(), m.total_size)
        };
        let lookups = self.hits + self.misses;
        CacheStats {
            entries,
            total_size,
            max_size: self.max_size,
            hits: self.hits,
            misses: self.misses,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                self.hits as f64 / lookups as f64
            },
        }
    }

    /// Returns the manifest, loading it from disk on first use.
    ///
    /// A missing or unreadable manifest starts the cache empty.
    fn manifest_mut(&mut self) -> &mut Manifest {
        let max_size = self.max_size;
        let cache_dir = &self.cache_dir;
        let clock = &mut self.clock;
        self.manifest.get_or_insert_with(|| {
            let mut manifest = Manifest::load(cache_dir).unwrap_or_else(|| Manifest::new(max_size));
            manifest.max_size = max_size;
            *clock = manifest
                .entries
                .iter()
                .map(|e| e.last_accessed_ms)
                .max()
                .unwrap_or(0);
            tracing::debug!(
                entries = manifest.len(),
                total_size = manifest.total_size,
                "cache manifest loaded"
            );
            manifest
        })
    }

    fn persist(&self) -> Result<(), CacheError> {
        match &self.manifest {
            Some(m) => m.save(&self.cache_dir),
            None => Ok(()),
        }
    }

    /// Saves without failing the caller. Used where losing the write only
    /// costs a stale record or an older access time.
    fn persist_absorbing(&self, key: &Fingerprint) {
        if let Err(e) = self.persist() {
            tracing::warn!(key = %key, error = %e, "could not save cache manifest");
        }
    }

    /// Next access timestamp: wall-clock milliseconds, forced strictly
    /// increasing so accesses within one millisecond still order correctly.
    fn tick(&mut self) -> u64 {
        self.manifest_mut();
        self.clock = featc_common::now_millis().max(self.clock + 1);
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::sample_entry;

    fn make_cache(max: u64) -> (tempfile::TempDir, Cache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path(), max);
        (dir, cache)
    }

    fn key(name: &str) -> Fingerprint {
        Cache::fingerprint(name, "rules", "0.1.0", "python")
    }

    #[test]
    fn set_then_get_roundtrip() {
        let (_dir, mut cache) = make_cache(1 << 20);
        let entry = sample_entry("print('hi')");
        cache.set(&key("a"), &entry).unwrap();
        assert_eq!(cache.get(&key("a")).unwrap(), Some(entry));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn get_before_set_is_one_miss() {
        let (_dir, mut cache) = make_cache(1 << 20);
        assert!(cache.get(&key("a")).unwrap().is_none());
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test]
    fn hit_rate() {
        let (_dir, mut cache) = make_cache(1 << 20);
        cache.set(&key("a"), &sample_entry("x")).unwrap();
        cache.get(&key("a")).unwrap();
        cache.get(&key("a")).unwrap();
        cache.get(&key("b")).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn fresh_stats_have_zero_hit_rate() {
        let (_dir, mut cache) = make_cache(100);
        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.max_size, 100);
    }

    #[test]
    fn missing_backing_file_is_silent_miss() {
        let (dir, mut cache) = make_cache(1 << 20);
        cache.set(&key("a"), &sample_entry("x")).unwrap();
        std::fs::remove_file(dir.path().join(EntryStore::file_name(key("a").as_str()))).unwrap();

        assert!(cache.get(&key("a")).unwrap().is_none());
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.total_size, 0);
    }

    #[test]
    fn corrupt_entry_is_cleared_and_missed() {
        let (dir, mut cache) = make_cache(1 << 20);
        cache.set(&key("a"), &sample_entry("x")).unwrap();
        let path = dir.path().join(EntryStore::file_name(key("a").as_str()));
        std::fs::write(&path, br#"{"format_version":1}"#).unwrap();

        assert!(cache.get(&key("a")).unwrap().is_none());
        assert!(!path.exists());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn is_valid_has_no_side_effects() {
        let (_dir, mut cache) = make_cache(1 << 20);
        assert!(!cache.is_valid(&key("a")));
        cache.set(&key("a"), &sample_entry("x")).unwrap();
        assert!(cache.is_valid(&key("a")));
        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn overwrite_adjusts_total_by_delta() {
        let (_dir, mut cache) = make_cache(1 << 20);
        cache.set(&key("a"), &sample_entry("short")).unwrap();
        let before = cache.stats().total_size;
        cache
            .set(&key("a"), &sample_entry("a considerably longer payload"))
            .unwrap();
        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(
            stats.total_size,
            before + ("a considerably longer payload".len() - "short".len()) as u64
        );
    }

    #[test]
    fn set_does_not_evict() {
        let (_dir, mut cache) = make_cache(10);
        cache.set(&key("a"), &sample_entry("x")).unwrap();
        cache.set(&key("b"), &sample_entry("y")).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert!(stats.total_size > 10);
    }

    #[test]
    fn evict_removes_least_recently_accessed() {
        let (_dir, mut cache) = make_cache(1 << 20);
        for name in ["a", "b", "c"] {
            cache.set(&key(name), &sample_entry(name)).unwrap();
        }
        cache.get(&key("a")).unwrap();
        let one = cache.stats().total_size / 3;

        let report = cache.evict(one * 2).unwrap();
        assert_eq!(report.removed, vec![key("b").to_string()]);
        assert!(cache.is_valid(&key("a")));
        assert!(cache.is_valid(&key("c")));
        assert!(cache.stats().total_size <= one * 2);
    }

    #[test]
    fn evict_to_zero_empties_cache() {
        let (dir, mut cache) = make_cache(1 << 20);
        cache.set(&key("a"), &sample_entry("x")).unwrap();
        cache.set(&key("b"), &sample_entry("y")).unwrap();
        let report = cache.evict(0).unwrap();
        assert_eq!(report.removed.len(), 2);
        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.total_size, 0);
        assert!(!dir
            .path()
            .join(EntryStore::file_name(key("a").as_str()))
            .exists());
    }

    #[test]
    fn evict_under_budget_is_noop() {
        let (_dir, mut cache) = make_cache(1 << 20);
        cache.set(&key("a"), &sample_entry("x")).unwrap();
        let report = cache.evict(1 << 20).unwrap();
        assert!(report.removed.is_empty());
        assert_eq!(cache.stats().entries, 1);
    }

    #[test]
    fn evict_tolerates_already_deleted_files() {
        let (dir, mut cache) = make_cache(1 << 20);
        cache.set(&key("a"), &sample_entry("x")).unwrap();
        std::fs::remove_file(dir.path().join(EntryStore::file_name(key("a").as_str()))).unwrap();
        let report = cache.evict(0).unwrap();
        assert_eq!(report.removed.len(), 1);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn evict_never_touches_files_outside_the_cache() {
        let root = tempfile::tempdir().unwrap();
        let cache_dir = root.path().join("project").join(".featc-cache");
        let victim = root.path().join("victim.json");
        std::fs::write(&victim, b"precious").unwrap();

        let good = key("a");
        let mut manifest = Manifest::new(1 << 20);
        manifest.upsert(good.as_str(), EntryStore::file_name(good.as_str()), 10, 1);
        manifest.upsert("../../../victim", "entries/../../../victim.json".into(), 10, 0);
        manifest.save(&cache_dir).unwrap();

        let mut cache = Cache::new(&cache_dir, 1 << 20);
        let report = cache.evict(0).unwrap();
        assert_eq!(report.removed, vec![good.to_string()]);
        assert!(victim.exists());
    }

    #[test]
    fn invalidate_saves_manifest_when_a_delete_fails() {
        let (dir, mut cache) = make_cache(1 << 20);
        let entry = sample_entry("x");
        cache.set(&key("a"), &entry).unwrap();
        cache.set(&key("b"), &entry).unwrap();

        // A non-empty directory where the entry file should be: unreadable and undeletable.
        let blocked = dir.path().join(EntryStore::file_name(key("a").as_str()));
        std::fs::remove_file(&blocked).unwrap();
        std::fs::create_dir_all(blocked.join("inner")).unwrap();

        let removed = cache
            .invalidate(&entry.source_hash, &entry.rules_hash, "0.1.0", "python")
            .unwrap();
        assert_eq!(removed, vec![key("a").to_string()]);

        let mut reopened = Cache::new(dir.path(), 1 << 20);
        assert_eq!(reopened.stats().entries, 1);
        assert!(reopened.is_valid(&key("b")));
    }

    #[test]
    fn hit_survives_unsaveable_manifest() {
        let (dir, mut cache) = make_cache(1 << 20);
        cache.set(&key("a"), &sample_entry("x")).unwrap();
        let manifest = dir.path().join("manifest.json");
        std::fs::remove_file(&manifest).unwrap();
        std::fs::create_dir(&manifest).unwrap();

        let entry = cache.get(&key("a")).unwrap();
        assert_eq!(entry, Some(sample_entry("x")));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn invalidate_removes_exactly_mismatching_entries() {
        let (_dir, mut cache) = make_cache(1 << 20);
        let keep = sample_entry("keep");
        let mut other_target = sample_entry("rust");
        other_target.metadata.target = "rust".to_string();
        let mut other_rules = sample_entry("old rules");
        other_rules.rules_hash = ContentHash::from_bytes(b"old rules");

        cache.set(&key("keep"), &keep).unwrap();
        cache.set(&key("target"), &other_target).unwrap();
        cache.set(&key("rules"), &other_rules).unwrap();

        let removed = cache
            .invalidate(&keep.source_hash, &keep.rules_hash, "0.1.0", "python")
            .unwrap();
        assert_eq!(removed.len(), 2);
        assert!(cache.is_valid(&key("keep")));
        assert!(!cache.is_valid(&key("target")));
        assert!(!cache.is_valid(&key("rules")));
    }

    #[test]
    fn invalidate_removes_unreadable_entries() {
        let (dir, mut cache) = make_cache(1 << 20);
        let entry = sample_entry("x");
        cache.set(&key("a"), &entry).unwrap();
        std::fs::write(
            dir.path().join(EntryStore::file_name(key("a").as_str())),
            b"garbage",
        )
        .unwrap();
        let removed = cache
            .invalidate(&entry.source_hash, &entry.rules_hash, "0.1.0", "python")
            .unwrap();
        assert_eq!(removed, vec![key("a").to_string()]);
    }

    #[test]
    fn invalidate_matching_with_wildcards() {
        let (_dir, mut cache) = make_cache(1 << 20);
        let mut a = sample_entry("a");
        a.source_hash = ContentHash::from_bytes(b"module a");
        let mut b = sample_entry("b");
        b.source_hash = ContentHash::from_bytes(b"module b");
        let mut old = sample_entry("old");
        old.metadata.tool_version = "0.0.9".to_string();
        cache.set(&key("a"), &a).unwrap();
        cache.set(&key("b"), &b).unwrap();
        cache.set(&key("old"), &old).unwrap();

        let filter = IdentityFilter {
            rules_hash: Some(a.rules_hash.clone()),
            tool_version: Some("0.1.0".to_string()),
            target: Some("python".to_string()),
            ..IdentityFilter::default()
        };
        let removed = cache.invalidate_matching(&filter).unwrap();
        assert_eq!(removed, vec![key("old").to_string()]);
        assert_eq!(cache.stats().entries, 2);
    }

    #[test]
    fn clear_single_and_all() {
        let (_dir, mut cache) = make_cache(1 << 20);
        cache.set(&key("a"), &sample_entry("x")).unwrap();
        cache.set(&key("b"), &sample_entry("y")).unwrap();

        cache.clear(Some(&key("a"))).unwrap();
        assert!(!cache.is_valid(&key("a")));
        assert!(cache.is_valid(&key("b")));
        assert_eq!(cache.stats().entries, 1);

        cache.clear(None).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.total_size, 0);
    }

    #[test]
    fn clear_unknown_key_is_ok() {
        let (_dir, mut cache) = make_cache(1 << 20);
        cache.clear(Some(&key("nope"))).unwrap();
    }

    #[test]
    fn manifest_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let entry = sample_entry("persisted");
        {
            let mut cache = Cache::new(dir.path(), 1 << 20);
            cache.set(&key("a"), &entry).unwrap();
        }
        let mut cache = Cache::new(dir.path(), 1 << 20);
        assert_eq!(cache.stats().entries, 1);
        assert_eq!(cache.get(&key("a")).unwrap(), Some(entry));
    }

    #[test]
    fn corrupt_manifest_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(crate::manifest::MANIFEST_FILE), "{{{").unwrap();
        let mut cache = Cache::new(dir.path(), 1 << 20);
        assert_eq!(cache.stats().entries, 0);
        assert!(cache.get(&key("a")).unwrap().is_none());
    }

    #[test]
    fn with_max_size_parses_units() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::with_max_size(dir.path(), "1KB").unwrap();
        assert_eq!(cache.max_size(), 1024);
    }

    #[test]
    fn with_max_size_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let err = Cache::with_max_size(dir.path(), "a lot").err().unwrap();
        assert!(matches!(err, CacheError::InvalidMaxSize(_)));
    }

    #[test]
    fn set_into_unwritable_location_is_operation_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("cache");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let mut cache = Cache::new(&blocker, 1 << 20);
        let err = cache.set(&key("a"), &sample_entry("x")).unwrap_err();
        assert_eq!(err.operation(), Some(CacheOperation::Set));
        assert!(err.to_string().contains(key("a").as_str()));
    }
}
