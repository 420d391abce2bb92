//! Module descriptors produced by the structural parser.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One discovered module, as described by its source header.
///
/// Descriptors are replaced wholesale on re-parse and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    /// Unique module name.
    pub name: String,
    /// The file the module was parsed from.
    pub source: PathBuf,
    /// Names of the modules this one depends on, in declaration order.
    pub dependencies: Vec<String>,
    /// Symbols this module provides to its dependents.
    pub exports: Vec<String>,
    /// When the module was last parsed, in milliseconds since the Unix epoch.
    pub parsed_at_ms: u64,
}

impl ModuleDescriptor {
    /// Creates a descriptor stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        dependencies: Vec<String>,
        exports: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            dependencies,
            exports,
            parsed_at_ms: featc_common::now_millis(),
        }
    }
}

/// The parser's output for one source unit: a descriptor plus any structural
/// errors found while reading its header.
///
/// Units with errors are left out of the registry entirely.
#[derive(Debug, Clone)]
pub struct ParsedModule {
    /// The module descriptor (possibly incomplete when `errors` is non-empty).
    pub descriptor: ModuleDescriptor,
    /// Structural errors, empty on a clean parse.
    pub errors: Vec<String>,
}

impl ParsedModule {
    /// Wraps a descriptor from a clean parse.
    pub fn ok(descriptor: ModuleDescriptor) -> Self {
        Self {
            descriptor,
            errors: Vec::new(),
        }
    }

    /// Returns `true` if the parse produced no structural errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<ModuleDescriptor> for ParsedModule {
    fn from(descriptor: ModuleDescriptor) -> Self {
        Self::ok(descriptor)
    }
}
