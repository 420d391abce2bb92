//! Error types for cache operations.

use std::fmt;
use std::path::PathBuf;

use featc_common::ParseByteSizeError;

/// The public cache operation an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOperation {
    /// Reading an entry.
    Get,
    /// Writing an entry.
    Set,
    /// Removing one or all entries.
    Clear,
    /// Size-bounded eviction.
    Evict,
    /// Identity-based invalidation.
    Invalidate,
}

impl fmt::Display for CacheOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheOperation::Get => "get",
            CacheOperation::Set => "set",
            CacheOperation::Clear => "clear",
            CacheOperation::Evict => "evict",
            CacheOperation::Invalidate => "invalidate",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during cache operations.
///
/// Reads are fail-safe: a missing or corrupt entry is reported as a miss, not
/// an error. Storage failures that would leave the cache inconsistent (a failed
/// write, a manifest that cannot be saved) surface as [`CacheError::Operation`].
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The configured maximum cache size could not be parsed.
    #[error("invalid maximum cache size: {0}")]
    InvalidMaxSize(#[from] ParseByteSizeError),

    /// A storage failure inside a public cache operation.
    #[error("cache {operation} failed{}: {source}", key_suffix(.key))]
    Operation {
        /// The operation that failed.
        operation: CacheOperation,
        /// The entry key involved, if the operation targets one.
        key: Option<String>,
        /// The underlying storage failure.
        source: Box<CacheError>,
    },
}

fn key_suffix(key: &Option<String>) -> String {
    match key {
        Some(k) => format!(" for key {k}"),
        None => String::new(),
    }
}

impl CacheError {
    /// Wraps a storage error in the operation it occurred in.
    pub(crate) fn during(self, operation: CacheOperation, key: Option<&str>) -> Self {
        match self {
            already @ CacheError::Operation { .. } => already,
            other => CacheError::Operation {
                operation,
                key: key.map(str::to_string),
                source: Box::new(other),
            },
        }
    }

    /// Returns the failing operation, if this is an operation error.
    pub fn operation(&self) -> Option<CacheOperation> {
        match self {
            CacheError::Operation { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}
