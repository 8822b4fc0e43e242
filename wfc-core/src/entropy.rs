//! Entropy calculation and lowest-entropy cell selection.

use crate::grid::{Grid, PossibilityGrid, Position};
use rand::RngCore;

mod cpu;
pub use cpu::CpuEntropyCalculator;

/// Per-cell domain sizes. Zero marks a contradiction, one a decided cell.
pub type EntropyGrid = Grid<usize>;

/// Strategy for scoring cells and picking the next one to collapse.
pub trait EntropyCalculator {
    /// Scores every cell of `grid`.
    #[must_use]
    fn calculate_entropy(&self, grid: &PossibilityGrid) -> EntropyGrid;

    /// Picks one of the undecided cells with the lowest score.
    ///
    /// Returns `None` when no cell has two or more candidates.
    fn select_lowest_entropy_cell(
        &self,
        entropy_grid: &EntropyGrid,
        rng: &mut dyn RngCore,
    ) -> Option<Position>;
}
