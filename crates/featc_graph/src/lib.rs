//! Module discovery, dependency validation and compile ordering.
//!
//! Parsed module descriptors are collected into a [`ModuleRegistry`], turned
//! into an immutable [`DependencyGraph`], checked with [`detect_cycles`] and
//! linearized with [`resolve_order`].

#![warn(missing_docs)]

pub mod cycles;
pub mod descriptor;
pub mod error;
pub mod graph;
pub mod order;
pub mod registry;

pub use cycles::{detect_cycles, Cycle};
pub use descriptor::{ModuleDescriptor, ParsedModule};
pub use error::GraphError;
pub use graph::DependencyGraph;
pub use order::resolve_order;
pub use registry::ModuleRegistry;
