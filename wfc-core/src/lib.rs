//! Core library for the Wave Function Collapse tile solver.
//! Defines the possibility grid, entropy selection, constraint propagation
//! and the run loop that ties them together.

use std::time::Duration;
use thiserror::Error;

/// Entropy calculation logic and traits.
pub mod entropy;
/// Generic 2D grid structures and the possibility grid.
pub mod grid;
/// Constraint propagation logic and traits.
pub mod propagator;
/// The core WFC algorithm runner.
pub mod runner;

pub use crate::entropy::{CpuEntropyCalculator, EntropyCalculator, EntropyGrid};
pub use crate::grid::{Grid, GridError, PossibilityGrid, Position};
pub use crate::propagator::{
    ConstraintPropagator, CpuConstraintPropagator, DepthLimit, PropagationError, PropagationStats,
};
pub use crate::runner::{
    run, CollapseStep, RunReport, Solver, StepOutcome, WfcConfig, WfcConfigBuilder,
};
pub use wfc_rules::{ModuleCatalog, ModuleId};

/// Errors that can occur during the Wave Function Collapse algorithm.
#[derive(Error, Debug)]
pub enum WfcError {
    /// A cell was left with no possible module.
    #[error("Contradiction: no module fits cell {0}")]
    Contradiction(Position),
    /// An error related to grid dimensions or accessing grid data.
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
    #[error("Grid cells track {grid} modules but the catalog defines {catalog}")]
    ModuleCountMismatch { grid: usize, catalog: usize },
    /// WFC run was interrupted through the shutdown signal.
    #[error("WFC run interrupted by signal")]
    Interrupted,
    /// WFC exceeded the configured maximum number of iterations.
    #[error("Maximum iterations ({0}) reached")]
    MaxIterationsReached(u64),
    /// The per-iteration observer asked to stop.
    #[error("Observer error: {0}")]
    Observer(String),
}

impl From<PropagationError> for WfcError {
    fn from(error: PropagationError) -> Self {
        match error {
            PropagationError::Contradiction(pos) => Self::Contradiction(pos),
            PropagationError::Grid(e) => Self::Grid(e),
        }
    }
}

/// Snapshot handed to the per-iteration observer.
#[derive(Debug, Clone, Copy)]
pub struct ProgressInfo<'a> {
    /// The number of iterations completed so far.
    pub iterations: u64,
    /// Cells whose domain is down to a single module.
    pub collapsed_cells: usize,
    pub total_cells: usize,
    /// Time elapsed since the WFC run started.
    pub elapsed_time: Duration,
    /// The collapse performed by the iteration that just finished.
    pub last_step: CollapseStep,
    /// Read-only view of the grid after propagation.
    pub grid: &'a PossibilityGrid,
}
