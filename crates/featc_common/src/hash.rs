//! Content hashing and cache fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of a hex-encoded SHA-256 digest.
const HEX_DIGEST_LEN: usize = 64;

/// A SHA-256 content hash stored as 64 lowercase hex characters.
///
/// Used to record the source and rules text a cache entry was produced from,
/// so each can be checked individually during invalidation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Computes a content hash from a byte slice.
    pub fn from_bytes(data: impl AsRef<[u8]>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data.as_ref());
        Self(hex::encode(hasher.finalize()))
    }

    /// Returns the hex representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}..)", &self.0[..self.0.len().min(8)])
    }
}

/// The cache key identifying one (source, rules, tool version, target) combination.
///
/// Each component is framed by its length before hashing, so two fingerprints
/// are equal only when all four inputs are byte-identical.
///
/// A fingerprint is always 64 lowercase hex characters; parsing and
/// deserialization reject anything else, so a key can name a file only
/// inside the cache's entry directory.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

/// Error returned when a string is not a well-formed fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cache key '{input}' (expected 64 lowercase hex characters)")]
pub struct ParseFingerprintError {
    /// The rejected input.
    pub input: String,
}

impl Fingerprint {
    /// Computes the fingerprint for a module compilation.
    pub fn compute(source: &str, rules: &str, tool_version: &str, target: &str) -> Self {
        let mut hasher = Sha256::new();
        for part in [source, rules, tool_version, target] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Returns `true` if `key` has the shape of a fingerprint.
    pub fn is_well_formed(key: &str) -> bool {
        key.len() == HEX_DIGEST_LEN
            && key
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    /// Returns the key as a string slice. This is also the entry's file stem.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_well_formed(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ParseFingerprintError {
                input: s.to_string(),
            })
        }
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = ParseFingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_well_formed(&value) {
            Ok(Self(value))
        } else {
            Err(ParseFingerprintError { input: value })
        }
    }
}

impl From<Fingerprint> for String {
    fn from(f: Fingerprint) -> Self {
        f.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({}..)", &self.0[..self.0.len().min(12)])
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
