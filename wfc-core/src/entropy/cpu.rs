use crate::entropy::{EntropyCalculator, EntropyGrid};
use crate::grid::{PossibilityGrid, Position};
use rand::seq::SliceRandom;
use rand::RngCore;
use rayon::prelude::*;

/// CPU implementation of [`EntropyCalculator`]: entropy is the domain size.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuEntropyCalculator;

impl CpuEntropyCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl EntropyCalculator for CpuEntropyCalculator {
    fn calculate_entropy(&self, grid: &PossibilityGrid) -> EntropyGrid {
        let cells = grid.cells();
        let mut entropy_grid = EntropyGrid::new(cells.width, cells.height);

        entropy_grid
            .data
            .par_iter_mut()
            .zip(cells.data.par_iter())
            .for_each(|(entropy_cell, possibility_cell)| {
                *entropy_cell = possibility_cell.count_ones();
            });

        entropy_grid
    }

    fn select_lowest_entropy_cell(
        &self,
        entropy_grid: &EntropyGrid,
        rng: &mut dyn RngCore,
    ) -> Option<Position> {
        // Decided (1) and contradictory (0) cells never compete.
        let min_entropy = entropy_grid
            .data
            .par_iter()
            .copied()
            .filter(|&entropy| entropy >= 2)
            .min()?;

        // Row-major order keeps the choice reproducible for a given rng state.
        let lowest_cells: Vec<usize> = entropy_grid
            .data
            .iter()
            .enumerate()
            .filter(|&(_, &entropy)| entropy == min_entropy)
            .map(|(index, _)| index)
            .collect();

        lowest_cells
            .choose(rng)
            .map(|&index| entropy_grid.position_of(index))
    }
}
