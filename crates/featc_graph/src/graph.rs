//! The module dependency graph.
//!
//! A [`DependencyGraph`] is built once per registry snapshot and is immutable
//! afterwards. Forward edges point from a module to the modules it depends on;
//! reverse edges are their exact transpose.

use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::GraphError;
use crate::registry::ModuleRegistry;

/// Directed dependency graph over registered modules.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Every registered module name.
    nodes: BTreeSet<String>,
    /// Module -> modules it depends on. Every node has an entry.
    edges: BTreeMap<String, BTreeSet<String>>,
    /// Module -> modules that depend on it. Every node has an entry.
    reverse_edges: BTreeMap<String, BTreeSet<String>>,
    /// Memoized compile order, written once on the first successful resolve.
    pub(crate) compile_order: OnceCell<Vec<String>>,
}

impl DependencyGraph {
    /// Builds the graph from a registry.
    ///
    /// Fails with [`GraphError::UnknownDependency`] on the first declared
    /// dependency that names no registered module; no partial graph is returned.
    pub fn build(registry: &ModuleRegistry) -> Result<Self, GraphError> {
        let nodes: BTreeSet<String> = registry.names().map(str::to_string).collect();
        let mut edges: BTreeMap<String, BTreeSet<String>> = nodes
            .iter()
            .map(|n| (n.clone(), BTreeSet::new()))
            .collect();
        let mut reverse_edges = edges.clone();

        for desc in registry.iter() {
            for dep in &desc.dependencies {
                if !nodes.contains(dep) {
                    return Err(GraphError::UnknownDependency {
                        module: desc.name.clone(),
                        dependency: dep.clone(),
                    });
                }
                if let Some(out) = edges.get_mut(&desc.name) {
                    out.insert(dep.clone());
                }
                if let Some(inc) = reverse_edges.get_mut(dep) {
                    inc.insert(desc.name.clone());
                }
            }
        }

        tracing::debug!(
            nodes = nodes.len(),
            edges = edges.values().map(BTreeSet::len).sum::<usize>(),
            "built dependency graph"
        );

        Ok(Self {
            nodes,
            edges,
            reverse_edges,
            compile_order: OnceCell::new(),
        })
    }

    /// Iterates over all module names in sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// Returns `true` if the graph contains the module.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains(name)
    }

    /// Returns the number of modules.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no modules.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the direct dependencies of a module (empty if unknown).
    pub fn dependencies_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(name)
            .into_iter()
            .flat_map(|s| s.iter().map(String::as_str))
    }

    /// Returns the direct dependents of a module (empty if unknown).
    pub fn dependents_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.reverse_edges
            .get(name)
            .into_iter()
            .flat_map(|s| s.iter().map(String::as_str))
    }

    /// Returns every module that directly or transitively depends on `name`,
    /// in breadth-first discovery order. `name` itself is not included.
    pub fn transitive_dependents(&self, name: &str) -> Vec<String> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut out = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        seen.insert(name);
        queue.push_back(name);

        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents_of(current) {
                if seen.insert(dependent) {
                    out.push(dependent.to_string());
                    queue.push_back(dependent);
                }
            }
        }
        out
    }

    pub(crate) fn forward(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.edges
    }

    pub(crate) fn reverse(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.reverse_edges
    }
}
