//! Module catalog definitions for the tile collapse solver.
//!
//! A catalog is an ordered list of modules (tile types), each declaring the
//! modules it may be placed next to. Neighbor names are resolved to stable
//! [`ModuleId`]s once, at load time.

use thiserror::Error;

pub mod formats;
pub mod loader;
pub mod types;

pub use types::{Module, ModuleCatalog, ModuleId, ModuleRecord, SymmetryPolicy};

/// Errors raised while reading, parsing or validating a module catalog.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog ({format}): {message}")]
    ParseError {
        format: &'static str,
        message: String,
    },
    /// A neighbor name does not match any `module_name`.
    #[error("Module '{module}' references unknown neighbor '{neighbor}'")]
    UnknownModule { module: String, neighbor: String },
    #[error("No module named '{0}'")]
    ModuleNotFound(String),
    #[error("Duplicate module name: {0}")]
    DuplicateModule(String),
    #[error("Catalog defines no modules")]
    EmptyCatalog,
    /// Raised under [`SymmetryPolicy::Strict`] only.
    #[error("Adjacency '{from}' -> '{to}' is declared without the reverse rule")]
    AsymmetricAdjacency { from: String, to: String },
    #[error("Unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}
