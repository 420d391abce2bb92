//! Byte sizes with unit parsing and display.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// A size in bytes.
///
/// Parses strings like "100MB", "1KB", "2 GB", "512B" and bare numbers
/// (interpreted as bytes). Units are powers of 1024 and case-insensitive.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ByteSize(u64);

impl ByteSize {
    /// Creates a size from a number of bytes.
    pub fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Returns the size in bytes.
    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteSize({self})")
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        if b != 0 && b % GB == 0 {
            write!(f, "{}GB", b / GB)
        } else if b != 0 && b % MB == 0 {
            write!(f, "{}MB", b / MB)
        } else if b != 0 && b % KB == 0 {
            write!(f, "{}KB", b / KB)
        } else {
            write!(f, "{b}B")
        }
    }
}

/// Error returned when a size string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid size: '{input}' (expected a number followed by B, KB, MB or GB)")]
pub struct ParseByteSizeError {
    /// The input string that failed to parse.
    pub input: String,
}

impl FromStr for ByteSize {
    type Err = ParseByteSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseByteSizeError {
            input: s.to_string(),
        };

        let upper = s.to_ascii_uppercase();
        let (num, multiplier) = if let Some(num) = upper.strip_suffix("GB") {
            (num, GB)
        } else if let Some(num) = upper.strip_suffix("MB") {
            (num, MB)
        } else if let Some(num) = upper.strip_suffix("KB") {
            (num, KB)
        } else if let Some(num) = upper.strip_suffix('B') {
            (num, 1)
        } else {
            (upper.as_str(), 1)
        };

        let num = num.trim();
        if num.is_empty() {
            return Err(err());
        }
        let val: f64 = num.parse().map_err(|_| err())?;
        if !val.is_finite() || val < 0.0 {
            return Err(err());
        }
        let bytes = val * multiplier as f64;
        if bytes >= u64::MAX as f64 {
            return Err(err());
        }
        Ok(ByteSize(bytes as u64))
    }
}
