//! Circular dependency detection.

use std::collections::HashSet;

use serde::Serialize;

use crate::graph::DependencyGraph;

/// A closed chain of modules, each depending on the next.
///
/// The first module is repeated at the end, e.g. `[A, B, A]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    /// Module names forming the loop.
    pub modules: Vec<String>,
    /// Human-readable description.
    pub message: String,
}

impl Cycle {
    fn new(modules: Vec<String>) -> Self {
        let message = format!("Circular dependency detected: {}", modules.join(" -> "));
        Self { modules, message }
    }
}

struct Search<'g> {
    graph: &'g DependencyGraph,
    visited: HashSet<&'g str>,
    on_stack: HashSet<&'g str>,
    path: Vec<&'g str>,
    cycles: Vec<Cycle>,
}

/// One module being expanded: its dependencies and the index of the next one to follow.
struct Frame<'g> {
    node: &'g str,
    deps: Vec<&'g str>,
    next: usize,
}

impl<'g> Search<'g> {
    fn enter(&mut self, node: &'g str) -> Frame<'g> {
        self.visited.insert(node);
        self.on_stack.insert(node);
        self.path.push(node);
        let graph = self.graph;
        Frame {
            node,
            deps: graph.dependencies_of(node).collect(),
            next: 0,
        }
    }

    /// Depth-first search from `root` with an explicit frame stack, so chain
    /// depth is bounded by the heap rather than the call stack.
    fn visit(&mut self, root: &'g str) {
        let mut frames = vec![self.enter(root)];

        while let Some(frame) = frames.last_mut() {
            let Some(&dep) = frame.deps.get(frame.next) else {
                let node = frame.node;
                frames.pop();
                self.path.pop();
                self.on_stack.remove(node);
                continue;
            };
            frame.next += 1;

            if self.on_stack.contains(dep) {
                if let Some(start) = self.path.iter().position(|n| *n == dep) {
                    let mut chain: Vec<String> =
                        self.path[start..].iter().map(|n| n.to_string()).collect();
                    chain.push(dep.to_string());
                    self.cycles.push(Cycle::new(chain));
                }
            } else if !self.visited.contains(dep) {
                let next = self.enter(dep);
                frames.push(next);
            }
        }
    }
}

/// Reports every circular dependency chain in the graph.
///
/// Runs a depth-first search from each unvisited module so independent cycles
/// in separate components are all found. Returns an empty list for an acyclic
/// graph. Never mutates the graph; repeated calls return equal results.
pub fn detect_cycles(graph: &DependencyGraph) -> Vec<Cycle> {
    let mut search = Search {
        graph,
        visited: HashSet::new(),
        on_stack: HashSet::new(),
        path: Vec::new(),
        cycles: Vec::new(),
    };

    for node in graph.nodes() {
        if !search.visited.contains(node) {
            search.visit(node);
        }
    }

    if !search.cycles.is_empty() {
        tracing::debug!(count = search.cycles.len(), "dependency cycles found");
    }
    search.cycles
}
