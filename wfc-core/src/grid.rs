use bitvec::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use wfc_rules::ModuleId;

/// A cell coordinate: `row` counts down from the top, `col` from the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Errors raised by grid reads and writes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Position {0} is outside the grid")]
    OutOfBounds(Position),
    /// Domains only ever shrink during a run.
    #[error("Refusing to grow the domain of cell {0}")]
    DomainGrowth(Position),
    #[error("Domain for cell {position} has {actual} bits, expected {expected}")]
    DomainSize {
        position: Position,
        expected: usize,
        actual: usize,
    },
}

/// A 2-D grid stored row-major in a flat vector.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    pub(crate) data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// Creates a new grid with the given dimensions, initialized with default values.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }
}

impl<T: Clone> Grid<T> {
    /// Creates a grid where every cell holds a clone of `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }
}

impl<T> Grid<T> {
    /// Returns an immutable reference to the element at `pos`,
    /// or None if it is out of bounds.
    pub fn get(&self, pos: Position) -> Option<&T> {
        self.index(pos).and_then(|idx| self.data.get(idx))
    }

    /// Returns a mutable reference to the element at `pos`,
    /// or None if it is out of bounds.
    pub fn get_mut(&mut self, pos: Position) -> Option<&mut T> {
        self.index(pos).and_then(move |idx| self.data.get_mut(idx))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates all cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(idx, value)| (Position::new(idx / width, idx % width), value))
    }

    pub(crate) fn position_of(&self, index: usize) -> Position {
        Position::new(index / self.width, index % self.width)
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.col < self.width && pos.row < self.height {
            Some(pos.row * self.width + pos.col)
        } else {
            None
        }
    }
}

/// Per-cell sets of still-possible modules.
///
/// Bit `i` of a cell's domain is set while module `i` can still be placed
/// there. The grid is square, never resized, and its domains only shrink.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PossibilityGrid {
    cells: Grid<BitVec>,
    num_modules: usize,
}

impl PossibilityGrid {
    /// An `n`×`n` grid where every cell may still hold any of `module_count` modules.
    pub fn new(n: usize, module_count: usize) -> Self {
        Self::with_initial_domain(n, bitvec![1; module_count])
    }

    /// An `n`×`n` grid where every cell starts from `domain`.
    ///
    /// Modules absent from `domain` can never be placed.
    pub fn with_initial_domain(n: usize, domain: BitVec) -> Self {
        let num_modules = domain.len();
        Self {
            cells: Grid::filled(n, n, domain),
            num_modules,
        }
    }

    /// Side length of the grid.
    pub fn size(&self) -> usize {
        self.cells.width
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    /// True for a zero-sized grid.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn num_modules(&self) -> usize {
        self.num_modules
    }

    pub fn domain(&self, pos: Position) -> Option<&BitSlice> {
        self.cells.get(pos).map(|d| d.as_bitslice())
    }

    /// Number of modules still possible at `pos`.
    pub fn entropy(&self, pos: Position) -> Option<usize> {
        self.cells.get(pos).map(|d| d.count_ones())
    }

    /// The decided module at `pos`, if the cell is collapsed.
    pub fn module_at(&self, pos: Position) -> Option<ModuleId> {
        self.cells.get(pos).and_then(|d| single_module(d))
    }

    /// Replaces the domain at `pos`.
    ///
    /// Returns whether the domain actually changed.
    ///
    /// # Errors
    ///
    /// * `GridError::OutOfBounds` if `pos` is outside the grid.
    /// * `GridError::DomainSize` if `new_domain` has the wrong length.
    /// * `GridError::DomainGrowth` if `new_domain` is not a subset of the current domain.
    pub fn set_domain(&mut self, pos: Position, new_domain: BitVec) -> Result<bool, GridError> {
        let expected = self.num_modules;
        let current = self.cells.get_mut(pos).ok_or(GridError::OutOfBounds(pos))?;
        if new_domain.len() != expected {
            return Err(GridError::DomainSize {
                position: pos,
                expected,
                actual: new_domain.len(),
            });
        }
        if new_domain.iter_ones().any(|i| !current[i]) {
            return Err(GridError::DomainGrowth(pos));
        }
        if *current == new_domain {
            return Ok(false);
        }
        *current = new_domain;
        Ok(true)
    }

    /// Fixes `pos` to the single module `module`.
    ///
    /// # Errors
    ///
    /// `GridError::DomainGrowth` if `module` was already ruled out at `pos`.
    pub fn collapse(&mut self, pos: Position, module: ModuleId) -> Result<(), GridError> {
        let mut singleton = bitvec![0; self.num_modules];
        if module.0 >= self.num_modules {
            return Err(GridError::DomainGrowth(pos));
        }
        singleton.set(module.0, true);
        self.set_domain(pos, singleton).map(|_| ())
    }

    /// In-bounds axis-aligned neighbors of `pos`: up, down, left, right.
    pub fn adjacent(&self, pos: Position) -> impl Iterator<Item = Position> {
        let (height, width) = (self.cells.height, self.cells.width);
        let up = pos.row.checked_sub(1).map(|r| Position::new(r, pos.col));
        let down = (pos.row + 1 < height).then(|| Position::new(pos.row + 1, pos.col));
        let left = pos.col.checked_sub(1).map(|c| Position::new(pos.row, c));
        let right = (pos.col + 1 < width).then(|| Position::new(pos.row, pos.col + 1));
        [up, down, left, right].into_iter().flatten()
    }

    /// Neighbors of `pos` that are still undecided (domain size > 1).
    ///
    /// Collapsed neighbors are never narrowed by propagation.
    pub fn neighbors_of(&self, pos: Position) -> Vec<Position> {
        self.adjacent(pos)
            .filter(|&n| self.entropy(n).is_some_and(|e| e > 1))
            .collect()
    }

    /// A lowest-entropy undecided cell, ties broken uniformly at random.
    ///
    /// Returns `None` once no cell has two or more candidates left.
    pub fn min_entropy_cell<R: rand::RngCore>(&self, rng: &mut R) -> Option<Position> {
        use crate::entropy::{CpuEntropyCalculator, EntropyCalculator};
        let calculator = CpuEntropyCalculator::new();
        calculator.select_lowest_entropy_cell(&calculator.calculate_entropy(self), rng)
    }

    pub fn is_finished(&self) -> bool {
        self.cells.data.iter().all(|d| d.count_ones() == 1)
    }

    pub fn collapsed_count(&self) -> usize {
        self.cells.data.iter().filter(|d| d.count_ones() == 1).count()
    }

    /// First cell with an empty domain, in row-major order.
    pub fn find_contradiction(&self) -> Option<Position> {
        self.cells
            .iter()
            .find(|(_, d)| d.not_any())
            .map(|(pos, _)| pos)
    }

    /// Every cell with its current domain, row-major.
    pub fn current_state(&self) -> impl Iterator<Item = (Position, &BitSlice)> {
        self.cells.iter().map(|(pos, d)| (pos, d.as_bitslice()))
    }

    /// Decided cells only. Undecided cells are skipped.
    pub fn collapsed_cells(&self) -> impl Iterator<Item = (Position, ModuleId)> + '_ {
        self.cells
            .iter()
            .filter_map(|(pos, d)| single_module(d).map(|m| (pos, m)))
    }

    pub(crate) fn cells(&self) -> &Grid<BitVec> {
        &self.cells
    }
}

fn single_module(domain: &BitSlice) -> Option<ModuleId> {
    if domain.count_ones() == 1 {
        domain.first_one().map(ModuleId)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_has_full_domains() {
        let grid = PossibilityGrid::new(3, 4);
        assert_eq!(grid.size(), 3);
        assert_eq!(grid.total_cells(), 9);
        for (_, domain) in grid.current_state() {
            assert_eq!(domain.count_ones(), 4);
        }
        assert!(!grid.is_finished());
        assert_eq!(grid.collapsed_count(), 0);
    }

    #[test]
    fn test_set_domain_rejects_growth() {
        let mut grid = PossibilityGrid::new(2, 3);
        let pos = Position::new(0, 1);
        assert_eq!(grid.set_domain(pos, bitvec![1, 0, 1]), Ok(true));
        assert_eq!(grid.set_domain(pos, bitvec![1, 0, 1]), Ok(false));
        assert_eq!(
            grid.set_domain(pos, bitvec![1, 1, 0]),
            Err(GridError::DomainGrowth(pos))
        );
        assert_eq!(grid.domain(pos).unwrap(), bitvec![1, 0, 1].as_bitslice());
    }

    #[test]
    fn test_set_domain_checks_length_and_bounds() {
        let mut grid = PossibilityGrid::new(2, 3);
        assert!(matches!(
            grid.set_domain(Position::new(0, 0), bitvec![1]),
            Err(GridError::DomainSize { expected: 3, actual: 1, .. })
        ));
        assert_eq!(
            grid.set_domain(Position::new(2, 0), bitvec![1, 0, 0]),
            Err(GridError::OutOfBounds(Position::new(2, 0)))
        );
    }

    #[test]
    fn test_adjacent_respects_bounds() {
        let grid = PossibilityGrid::new(3, 2);
        let corner: Vec<_> = grid.adjacent(Position::new(0, 0)).collect();
        assert_eq!(corner, vec![Position::new(1, 0), Position::new(0, 1)]);
        assert_eq!(grid.adjacent(Position::new(1, 1)).count(), 4);
    }

    #[test]
    fn test_module_at_only_for_collapsed() {
        let mut grid = PossibilityGrid::new(2, 3);
        grid.collapse(Position::new(1, 1), ModuleId(2)).unwrap();
        assert_eq!(grid.module_at(Position::new(1, 1)), Some(ModuleId(2)));
        assert_eq!(grid.module_at(Position::new(0, 0)), None);
        assert_eq!(
            grid.collapse(Position::new(1, 1), ModuleId(0)),
            Err(GridError::DomainGrowth(Position::new(1, 1)))
        );
    }
}
