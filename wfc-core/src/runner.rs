use crate::entropy::{CpuEntropyCalculator, EntropyCalculator};
use crate::grid::{PossibilityGrid, Position};
use crate::propagator::{
    ConstraintPropagator, CpuConstraintPropagator, DepthLimit, PropagationStats,
};
use crate::{ProgressInfo, WfcError};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wfc_rules::{ModuleCatalog, ModuleId};

/// Configuration options for the WFC runner.
#[derive(Debug, Clone)]
pub struct WfcConfig {
    pub depth_limit: DepthLimit,
    /// Seed for every random choice. A fresh one is drawn (and logged) when `None`.
    pub seed: Option<u64>,
    pub max_iterations: Option<u64>,
    /// Checked between iterations; setting it stops the run with `WfcError::Interrupted`.
    pub shutdown_signal: Arc<AtomicBool>,
}

impl WfcConfig {
    /// Creates a new builder for `WfcConfig`.
    pub fn builder() -> WfcConfigBuilder {
        WfcConfigBuilder::default()
    }
}

impl Default for WfcConfig {
    fn default() -> Self {
        Self {
            depth_limit: DepthLimit::Unbounded,
            seed: None,
            max_iterations: None,
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Builder for `WfcConfig`.
#[derive(Debug, Default)]
pub struct WfcConfigBuilder {
    depth_limit: DepthLimit,
    seed: Option<u64>,
    max_iterations: Option<u64>,
    shutdown_signal: Option<Arc<AtomicBool>>,
}

impl WfcConfigBuilder {
    pub fn depth_limit(mut self, depth_limit: DepthLimit) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn shutdown_signal(mut self, signal: Arc<AtomicBool>) -> Self {
        self.shutdown_signal = Some(signal);
        self
    }

    pub fn build(self) -> WfcConfig {
        WfcConfig {
            depth_limit: self.depth_limit,
            seed: self.seed,
            max_iterations: self.max_iterations,
            shutdown_signal: self
                .shutdown_signal
                .unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }
}

/// One irrevocable decision: `module` was placed at `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollapseStep {
    pub position: Position,
    pub module: ModuleId,
}

/// Result of a single [`Solver::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Collapsed {
        step: CollapseStep,
        stats: PropagationStats,
    },
    /// No undecided cell remains.
    Finished,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub seed: u64,
    pub iterations: u64,
    /// Every selection-driven collapse, in order.
    pub history: Vec<CollapseStep>,
    pub max_propagation_depth: usize,
    pub elapsed: Duration,
}

/// Drives the select / collapse / propagate loop over a borrowed grid.
#[derive(Debug)]
pub struct Solver<'a, P = CpuConstraintPropagator, E = CpuEntropyCalculator> {
    grid: &'a mut PossibilityGrid,
    catalog: &'a ModuleCatalog,
    propagator: P,
    entropy_calculator: E,
    rng: StdRng,
    seed: u64,
    max_iterations: Option<u64>,
    shutdown_signal: Arc<AtomicBool>,
    history: Vec<CollapseStep>,
    iterations: u64,
    max_propagation_depth: usize,
}

impl<'a> Solver<'a> {
    /// A solver using the CPU propagator and entropy calculator.
    ///
    /// # Errors
    ///
    /// See [`Solver::with_components`].
    pub fn new(
        grid: &'a mut PossibilityGrid,
        catalog: &'a ModuleCatalog,
        config: &WfcConfig,
    ) -> Result<Self, WfcError> {
        let propagator = CpuConstraintPropagator::new(config.depth_limit);
        debug!("Using CPU propagator, depth limit {:?}", propagator.depth_limit());
        Self::with_components(grid, catalog, config, propagator, CpuEntropyCalculator::new())
    }
}

impl<'a, P: ConstraintPropagator, E: EntropyCalculator> Solver<'a, P, E> {
    /// # Errors
    ///
    /// * `WfcError::ModuleCountMismatch` if the grid's domains do not match the catalog.
    /// * `WfcError::Contradiction` if some cell already has an empty domain.
    pub fn with_components(
        grid: &'a mut PossibilityGrid,
        catalog: &'a ModuleCatalog,
        config: &WfcConfig,
        propagator: P,
        entropy_calculator: E,
    ) -> Result<Self, WfcError> {
        if grid.num_modules() != catalog.len() {
            return Err(WfcError::ModuleCountMismatch {
                grid: grid.num_modules(),
                catalog: catalog.len(),
            });
        }
        if let Some(pos) = grid.find_contradiction() {
            error!("Initial contradiction found at {}", pos);
            return Err(WfcError::Contradiction(pos));
        }

        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        Ok(Self {
            grid,
            catalog,
            propagator,
            entropy_calculator,
            rng: StdRng::seed_from_u64(seed),
            seed,
            max_iterations: config.max_iterations,
            shutdown_signal: Arc::clone(&config.shutdown_signal),
            history: Vec::new(),
            iterations: 0,
            max_propagation_depth: 0,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn grid(&self) -> &PossibilityGrid {
        &*self.grid
    }

    pub fn history(&self) -> &[CollapseStep] {
        &self.history
    }

    /// Performs one selection, collapse and propagation.
    ///
    /// # Errors
    ///
    /// `WfcError::Contradiction` if propagation empties a domain. The grid is
    /// left as it was at the moment of failure.
    pub fn step(&mut self) -> Result<StepOutcome, WfcError> {
        let entropy = self.entropy_calculator.calculate_entropy(&*self.grid);
        let Some(position) = self
            .entropy_calculator
            .select_lowest_entropy_cell(&entropy, &mut self.rng)
        else {
            return Ok(StepOutcome::Finished);
        };

        let candidates: Vec<usize> = self
            .grid
            .domain(position)
            .map(|d| d.iter_ones().collect())
            .unwrap_or_default();
        let module = candidates
            .choose(&mut self.rng)
            .copied()
            .map(ModuleId)
            .ok_or(WfcError::Contradiction(position))?;
        self.grid.collapse(position, module)?;

        let stats = self
            .propagator
            .propagate(&mut *self.grid, vec![position], self.catalog)
            .map_err(|e| {
                error!("Propagation after collapsing {} to {} failed: {}", position, module, e);
                WfcError::from(e)
            })?;

        self.iterations += 1;
        self.max_propagation_depth = self.max_propagation_depth.max(stats.max_depth);
        let step = CollapseStep { position, module };
        self.history.push(step);
        debug!(
            "Iter {}: collapsed {} to {} ({} cells narrowed, depth {})",
            self.iterations, position, module, stats.cells_updated, stats.max_depth
        );
        Ok(StepOutcome::Collapsed { step, stats })
    }

    /// Runs to completion, calling `observer` once after every iteration.
    ///
    /// The observer only sees the grid through a shared borrow. Returning an
    /// error from it aborts the run with that error.
    ///
    /// # Errors
    ///
    /// Contradictions, interruption, the iteration limit, or an observer error.
    pub fn run<F>(&mut self, mut observer: F) -> Result<RunReport, WfcError>
    where
        F: FnMut(&ProgressInfo<'_>) -> Result<(), WfcError>,
    {
        let start_time = Instant::now();
        let total_cells = self.grid.total_cells();
        info!(
            "Starting WFC run: {}x{} grid, {} modules, seed {}",
            self.grid.size(),
            self.grid.size(),
            self.catalog.len(),
            self.seed
        );

        loop {
            if self.shutdown_signal.load(Ordering::Relaxed) {
                warn!("Shutdown signal received, stopping WFC run prematurely.");
                return Err(WfcError::Interrupted);
            }
            if let Some(limit) = self.max_iterations {
                if self.iterations >= limit && !self.grid.is_finished() {
                    warn!("Iteration limit {} reached before completion", limit);
                    return Err(WfcError::MaxIterationsReached(limit));
                }
            }

            match self.step()? {
                StepOutcome::Finished => break,
                StepOutcome::Collapsed { step, .. } => {
                    let info = ProgressInfo {
                        iterations: self.iterations,
                        collapsed_cells: self.grid.collapsed_count(),
                        total_cells,
                        elapsed_time: start_time.elapsed(),
                        last_step: step,
                        grid: &*self.grid,
                    };
                    observer(&info)?;
                }
            }
        }

        let elapsed = start_time.elapsed();
        info!(
            "WFC run finished: {} iterations in {:.2?}, deepest propagation {}",
            self.iterations, elapsed, self.max_propagation_depth
        );
        Ok(RunReport {
            seed: self.seed,
            iterations: self.iterations,
            history: self.history.clone(),
            max_propagation_depth: self.max_propagation_depth,
            elapsed,
        })
    }
}

/// Runs WFC on `grid` with the default CPU components and no observer.
///
/// # Errors
///
/// See [`Solver::run`].
pub fn run(
    grid: &mut PossibilityGrid,
    catalog: &ModuleCatalog,
    config: &WfcConfig,
) -> Result<RunReport, WfcError> {
    Solver::new(grid, catalog, config)?.run(|_| Ok(()))
}
