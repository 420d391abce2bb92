//! Compile-order resolution.

use std::collections::{BTreeMap, VecDeque};

use crate::graph::DependencyGraph;

/// Computes a linear processing order for the graph.
///
/// Kahn-style elimination seeded from reverse-edge counts: a module becomes
/// eligible once every module that depends on it has been emitted, so
/// dependents come before their dependencies (`Mathematics` before `Utils`).
/// Ties are broken by queue insertion order, which follows sorted module
/// names.
///
/// Returns an empty slice when a cycle prevents a complete order; use
/// [`detect_cycles`](crate::detect_cycles) to find out which modules are
/// involved. A successful order is memoized on the graph and returned
/// unchanged by later calls.
pub fn resolve_order(graph: &DependencyGraph) -> &[String] {
    if let Some(order) = graph.compile_order.get() {
        return order;
    }

    let mut remaining: BTreeMap<&str, usize> = graph
        .reverse()
        .iter()
        .map(|(name, dependents)| (name.as_str(), dependents.len()))
        .collect();

    let mut queue: VecDeque<&str> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(name, _)| *name)
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(node) = queue.pop_front() {
        order.push(node.to_string());
        for dep in graph.dependencies_of(node) {
            if let Some(count) = remaining.get_mut(dep) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(dep);
                }
            }
        }
    }

    if order.len() < graph.len() {
        tracing::debug!(
            resolved = order.len(),
            total = graph.len(),
            "compile order unavailable: dependency cycle"
        );
        return &[];
    }

    graph.compile_order.get_or_init(|| order)
}
