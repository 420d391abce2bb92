//! Shared foundational types used across the featc build pipeline.
//!
//! This crate provides content hashing and cache fingerprints, human-readable
//! byte sizes, module-name validation, and a wall-clock helper.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod size;
pub mod time;

pub use hash::{ContentHash, Fingerprint, ParseFingerprintError};
pub use ident::is_valid_module_name;
pub use size::{ByteSize, ParseByteSizeError};
pub use time::now_millis;
