//! Cache manifest tracking every stored entry.
//!
//! The manifest is stored as `manifest.json` in the cache directory. It is the
//! single record of which entries the cache believes exist, how large they are
//! and when each was last accessed.

use std::path::Path;

use featc_common::Fingerprint;
use serde::{Deserialize, Serialize};

use crate::entry::EntryStore;
use crate::error::CacheError;

/// Name of the manifest file within the cache directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Current manifest format version.
const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Index of all cache entries plus aggregate size accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version. A mismatch discards the manifest on load.
    pub format_version: u32,
    /// Entries in insertion order.
    pub entries: Vec<ManifestEntry>,
    /// Sum of all entry sizes, in bytes.
    pub total_size: u64,
    /// Configured maximum size, in bytes.
    pub max_size: u64,
}

/// Index record for one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// The entry's fingerprint.
    pub key: String,
    /// Entry file path relative to the cache directory.
    pub file: String,
    /// Serialized size of the entry, in bytes.
    pub size: u64,
    /// Last access time, in milliseconds since the Unix epoch.
    pub last_accessed_ms: u64,
}

impl Manifest {
    /// Creates an empty manifest with the given size budget.
    pub fn new(max_size: u64) -> Self {
        Self {
            format_version: MANIFEST_FORMAT_VERSION,
            entries: Vec::new(),
            total_size: 0,
            max_size,
        }
    }

    /// Loads the manifest from the cache directory, returning `None` if the
    /// file doesn't exist, can't be parsed or has a different format version.
    pub fn load(cache_dir: &Path) -> Option<Self> {
        let path = cache_dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<Manifest>(&content) {
            Ok(mut m) if m.format_version == MANIFEST_FORMAT_VERSION => {
                m.drop_malformed();
                Some(m)
            }
            Ok(m) => {
                tracing::warn!(
                    found = m.format_version,
                    expected = MANIFEST_FORMAT_VERSION,
                    "discarding cache manifest with unsupported format"
                );
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding unreadable cache manifest");
                None
            }
        }
    }

    /// Drops records whose key is not a fingerprint or whose file is not the
    /// key's own entry file. Such records could point outside the cache.
    fn drop_malformed(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|e| {
            Fingerprint::is_well_formed(&e.key) && e.file == EntryStore::file_name(&e.key)
        });
        if self.entries.len() != before {
            tracing::warn!(
                dropped = before - self.entries.len(),
                "dropping malformed cache manifest records"
            );
            self.total_size = self.entries.iter().map(|e| e.size).sum();
        }
    }

    /// Saves the manifest to the cache directory, creating it if needed.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        std::fs::create_dir_all(cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.to_path_buf(),
            source: e,
        })?;
        let path = cache_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| CacheError::Io { path, source: e })
    }

    /// Returns the record for `key`.
    pub fn get(&self, key: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut ManifestEntry> {
        self.entries.iter_mut().find(|e| e.key == key)
    }

    /// Inserts a record or, if `key` exists, updates its size and access time.
    /// Keeps `total_size` in step either way.
    pub fn upsert(&mut self, key: &str, file: String, size: u64, now_ms: u64) {
        if let Some(existing) = self.get_mut(key) {
            let old = existing.size;
            existing.size = size;
            existing.file = file;
            existing.last_accessed_ms = now_ms;
            self.total_size = self.total_size.saturating_sub(old) + size;
        } else {
            self.entries.push(ManifestEntry {
                key: key.to_string(),
                file,
                size,
                last_accessed_ms: now_ms,
            });
            self.total_size += size;
        }
    }

    /// Removes the record for `key`, returning it.
    pub fn remove(&mut self, key: &str) -> Option<ManifestEntry> {
        let idx = self.entries.iter().position(|e| e.key == key)?;
        let removed = self.entries.remove(idx);
        self.total_size = self.total_size.saturating_sub(removed.size);
        Some(removed)
    }

    /// Removes every record and resets the total size.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_size = 0;
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the manifest has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
