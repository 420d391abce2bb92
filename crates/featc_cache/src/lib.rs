//! Content-addressed compilation cache.
//!
//! Maps a fingerprint of (source, rules, tool version, target) to a previously
//! produced compilation result. Entries live as one JSON file each under the
//! cache root, indexed by a `manifest.json` that tracks sizes and access times
//! for least-recently-used eviction.

#![warn(missing_docs)]

pub mod cache;
pub mod entry;
pub mod error;
pub mod manifest;

pub use cache::{Cache, CacheStats, EvictionReport, IdentityFilter};
pub use entry::{CacheEntry, CachedOutput, EntryMetadata, EntryStore, ENTRY_FORMAT_VERSION};
pub use error::{CacheError, CacheOperation};
pub use manifest::{Manifest, ManifestEntry};
