use crate::grid::{GridError, PossibilityGrid, Position};
use crate::propagator::{ConstraintPropagator, DepthLimit, PropagationError, PropagationStats};
use log::trace;
use std::collections::VecDeque;
use wfc_rules::ModuleCatalog;

/// CPU constraint propagator driven by an explicit FIFO worklist.
///
/// Each entry carries its distance from the origin so a [`DepthLimit`] can
/// stop expansion without relying on call-stack depth.
#[derive(Debug, Clone, Default)]
pub struct CpuConstraintPropagator {
    depth_limit: DepthLimit,
}

impl CpuConstraintPropagator {
    pub fn new(depth_limit: DepthLimit) -> Self {
        Self { depth_limit }
    }

    pub fn depth_limit(&self) -> DepthLimit {
        self.depth_limit
    }

    fn may_expand(&self, depth: usize) -> bool {
        match self.depth_limit {
            DepthLimit::Unbounded => true,
            DepthLimit::Limited(limit) => depth < limit,
        }
    }
}

impl ConstraintPropagator for CpuConstraintPropagator {
    fn propagate(
        &mut self,
        grid: &mut PossibilityGrid,
        origins: Vec<Position>,
        catalog: &ModuleCatalog,
    ) -> Result<PropagationStats, PropagationError> {
        let mut stats = PropagationStats::default();
        let mut worklist: VecDeque<(Position, usize)> =
            origins.into_iter().map(|pos| (pos, 0)).collect();

        while let Some((pos, depth)) = worklist.pop_front() {
            // Every decided cell is checked, including entries past the depth limit.
            if let Some(module) = grid.module_at(pos) {
                for neighbor in grid.adjacent(pos) {
                    if let Some(other) = grid.module_at(neighbor) {
                        if !catalog.is_compatible(module, other)
                            && !catalog.is_compatible(other, module)
                        {
                            return Err(PropagationError::Contradiction(neighbor));
                        }
                    }
                }
            }

            if !self.may_expand(depth) {
                continue;
            }

            let domain = grid.domain(pos).ok_or(GridError::OutOfBounds(pos))?;
            let allowed = catalog.allowed_neighbors(domain);
            trace!(
                "Propagating from {} at depth {} ({} candidates)",
                pos,
                depth,
                domain.count_ones()
            );

            for neighbor in grid.neighbors_of(pos) {
                let mut new_domain = grid
                    .domain(neighbor)
                    .ok_or(GridError::OutOfBounds(neighbor))?
                    .to_bitvec();
                new_domain &= allowed.as_bitslice();

                if new_domain.not_any() {
                    return Err(PropagationError::Contradiction(neighbor));
                }
                if grid.set_domain(neighbor, new_domain)? {
                    stats.cells_updated += 1;
                    stats.max_depth = stats.max_depth.max(depth + 1);
                    worklist.push_back((neighbor, depth + 1));
                }
            }
        }

        Ok(stats)
    }
}
