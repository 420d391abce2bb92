//! Module registry mapping module names to their descriptors.
//!
//! The [`ModuleRegistry`] collects cleanly parsed modules and rejects duplicate
//! names. Units whose parse produced structural errors are skipped, so they
//! neither appear in the graph nor can be depended upon.

use std::collections::BTreeMap;

use crate::descriptor::{ModuleDescriptor, ParsedModule};
use crate::error::GraphError;

/// Registry of all modules discovered for one build.
///
/// Names are kept sorted so that everything derived from the registry
/// iterates in a deterministic order.
#[derive(Debug, Default, Clone)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, ModuleDescriptor>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from parsed units in one step.
    pub fn from_parsed<I>(units: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = ParsedModule>,
    {
        let mut reg = Self::new();
        reg.register(units)?;
        Ok(reg)
    }

    /// Registers a batch of parsed units.
    ///
    /// Units with structural errors are skipped. If any remaining unit shares
    /// a name with an already registered module (or with another unit in the
    /// batch), fails with [`GraphError::DuplicateModule`] and registers nothing
    /// from this batch. Returns the number of modules added.
    pub fn register<I>(&mut self, units: I) -> Result<usize, GraphError>
    where
        I: IntoIterator<Item = ParsedModule>,
    {
        let mut staged: BTreeMap<String, ModuleDescriptor> = BTreeMap::new();

        for unit in units {
            if !unit.is_clean() {
                tracing::debug!(
                    module = %unit.descriptor.name,
                    source = %unit.descriptor.source.display(),
                    errors = unit.errors.len(),
                    "skipping module with structural errors"
                );
                continue;
            }
            let desc = unit.descriptor;
            let prev = self
                .modules
                .get(&desc.name)
                .or_else(|| staged.get(&desc.name));
            if let Some(prev) = prev {
                return Err(GraphError::DuplicateModule {
                    name: desc.name.clone(),
                    first: prev.source.clone(),
                    second: desc.source,
                });
            }
            staged.insert(desc.name.clone(), desc);
        }

        let added = staged.len();
        self.modules.extend(staged);
        Ok(added)
    }

    /// Looks up a module by name.
    pub fn lookup(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(name)
    }

    /// Returns a copy of the module's declared dependencies, or an empty list
    /// if the module is unknown.
    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        self.modules
            .get(name)
            .map(|d| d.dependencies.clone())
            .unwrap_or_default()
    }

    /// Returns `true` if a module with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Iterates over registered module names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Iterates over all descriptors in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values()
    }

    /// Returns the number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if no modules are registered.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
