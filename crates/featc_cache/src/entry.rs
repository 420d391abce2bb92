//! Cache entry records and their on-disk store.
//!
//! Each entry is stored as `<cache_dir>/entries/<fingerprint>.json`. Reading an
//! entry back is a strict deserialization: missing fields, unknown formats or
//! a mismatched format version all count as "not a valid entry".

use std::path::{Path, PathBuf};

use featc_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Current entry format version. Increment on breaking changes to [`CacheEntry`].
pub const ENTRY_FORMAT_VERSION: u32 = 1;

/// Subdirectory holding entry files.
pub(crate) const ENTRIES_SUBDIR: &str = "entries";

/// File extension for entry files.
const ENTRY_EXT: &str = "json";

/// A stored compilation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheEntry {
    /// Entry format version; must equal [`ENTRY_FORMAT_VERSION`].
    pub format_version: u32,
    /// Hash of the module source the entry was compiled from.
    pub source_hash: ContentHash,
    /// Hash of the rules text active at compile time.
    pub rules_hash: ContentHash,
    /// The compiled output.
    pub payload: CachedOutput,
    /// Provenance of the compilation.
    pub metadata: EntryMetadata,
}

/// Generated code and side artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedOutput {
    /// The generated target code.
    pub code: String,
    /// Generated tests, if the transformer produced any.
    #[serde(default)]
    pub tests: Option<String>,
}

/// Provenance recorded alongside a cached result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// When the entry was produced, in milliseconds since the Unix epoch.
    pub created_at_ms: u64,
    /// Wall-clock duration of the original compilation.
    pub duration_ms: u64,
    /// Identifier of the model or engine that produced the output.
    pub model: String,
    /// Tool version the output was produced with.
    pub tool_version: String,
    /// Target identifier the output was produced for.
    pub target: String,
}

impl CacheEntry {
    /// Creates an entry with the current format version.
    pub fn new(
        source_hash: ContentHash,
        rules_hash: ContentHash,
        payload: CachedOutput,
        metadata: EntryMetadata,
    ) -> Self {
        Self {
            format_version: ENTRY_FORMAT_VERSION,
            source_hash,
            rules_hash,
            payload,
            metadata,
        }
    }
}

/// Directory of entry files, one per fingerprint.
pub struct EntryStore {
    /// Root cache directory.
    cache_dir: PathBuf,
}

impl EntryStore {
    /// Creates a store rooted at the given cache directory.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Returns the entries directory.
    pub fn dir(&self) -> PathBuf {
        self.cache_dir.join(ENTRIES_SUBDIR)
    }

    /// Ensures that the entries directory exists.
    pub fn ensure_dir(&self) -> Result<(), CacheError> {
        let dir = self.dir();
        std::fs::create_dir_all(&dir).map_err(|e| CacheError::Io {
            path: dir,
            source: e,
        })
    }

    /// Returns the manifest-relative file name for a key.
    pub fn file_name(key: &str) -> String {
        format!("{ENTRIES_SUBDIR}/{key}.{ENTRY_EXT}")
    }

    /// Resolves a manifest-relative file name to a full path.
    pub fn resolve(&self, file: &str) -> PathBuf {
        self.cache_dir.join(file)
    }

    /// Serializes and writes an entry, returning the number of bytes written.
    pub fn write(&self, file: &str, entry: &CacheEntry) -> Result<u64, CacheError> {
        self.ensure_dir()?;
        let bytes = serde_json::to_vec(entry).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        let path = self.resolve(file);
        std::fs::write(&path, &bytes).map_err(|e| CacheError::Io { path, source: e })?;
        Ok(bytes.len() as u64)
    }

    /// Returns `true` if the entry's backing file exists.
    pub fn exists(&self, file: &str) -> bool {
        self.resolve(file).is_file()
    }

    /// Reads and validates an entry.
    ///
    /// Returns `None` if the file is missing, is not valid JSON, lacks required
    /// fields, or carries a different format version.
    pub fn read(&self, file: &str) -> Option<CacheEntry> {
        let raw = std::fs::read(self.resolve(file)).ok()?;
        let entry: CacheEntry = serde_json::from_slice(&raw).ok()?;
        (entry.format_version == ENTRY_FORMAT_VERSION).then_some(entry)
    }

    /// Deletes an entry file. A file that is already gone is not an error.
    pub fn remove(&self, file: &str) -> Result<(), CacheError> {
        let path = self.resolve(file);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }

    /// Deletes every entry file.
    pub fn remove_all(&self) -> Result<(), CacheError> {
        let dir = self.dir();
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io {
                path: dir,
                source: e,
            }),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_entry(code: &str) -> CacheEntry {
    CacheEntry::new(
        ContentHash::from_bytes(b"Feature: Utils"),
        ContentHash::from_bytes(b"rules"),
        CachedOutput {
            code: code.to_string(),
            tests: None,
        },
        EntryMetadata {
            created_at_ms: 1_700_000_000_000,
            duration_ms: 1200,
            model: "test-model".to_string(),
            tool_version: "0.1.0".to_string(),
            target: "python".to_string(),
        },
    )
}
