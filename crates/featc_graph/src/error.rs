//! Error types for registry and graph construction.

use std::path::PathBuf;

/// Errors that abort a build's graph construction.
///
/// There is no partial graph: either every module and edge is valid, or
/// construction fails with the first problem found.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two modules declare the same name.
    #[error(
        "duplicate module '{name}': defined in {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateModule {
        /// The shared module name.
        name: String,
        /// Source location of the module registered first.
        first: PathBuf,
        /// Source location of the conflicting module.
        second: PathBuf,
    },

    /// A module depends on a name that is not a registered module.
    #[error("module '{module}' depends on unknown module '{dependency}'")]
    UnknownDependency {
        /// The module declaring the dependency.
        module: String,
        /// The missing dependency name.
        dependency: String,
    },
}
