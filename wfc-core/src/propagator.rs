//! Constraint propagation logic and traits.

use crate::grid::{GridError, PossibilityGrid, Position};
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use wfc_rules::ModuleCatalog;

mod cpu;
pub use cpu::CpuConstraintPropagator;

/// Errors that can occur during the constraint propagation phase of WFC.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PropagationError {
    /// A cell ran out of candidate modules, or two decided neighbors
    /// violate the catalog in both directions.
    #[error("Contradiction detected during propagation at {0}")]
    Contradiction(Position),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// How far a single propagation may travel from the cell it starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthLimit {
    /// Propagate until no domain changes any more.
    #[default]
    Unbounded,
    /// Stop expanding cells `n` steps away from the origin. `Limited(0)`
    /// disables propagation; `Limited(1)` only narrows direct neighbors.
    Limited(usize),
}

impl fmt::Display for DepthLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("unbounded"),
            Self::Limited(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for DepthLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("unbounded") {
            return Ok(Self::Unbounded);
        }
        trimmed
            .parse::<usize>()
            .map(Self::Limited)
            .map_err(|_| format!("invalid depth limit '{s}': expected 'unbounded' or a number"))
    }
}

#[cfg(feature = "serde")]
impl Serialize for DepthLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unbounded => serializer.serialize_str("unbounded"),
            Self::Limited(n) => serializer.serialize_u64(*n as u64),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for DepthLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Depth(usize),
            Text(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Depth(n) => Ok(Self::Limited(n)),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// What one propagation call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Number of domain writes that removed at least one module.
    pub cells_updated: usize,
    /// Furthest distance (in propagation steps) at which a domain changed.
    pub max_depth: usize,
}

/// Trait defining the interface for a constraint propagation algorithm.
///
/// Implementors narrow the domains around the cells in `origins` until the
/// grid is consistent with `catalog`, or report a contradiction.
#[cfg_attr(test, mockall::automock)]
pub trait ConstraintPropagator {
    /// Propagates constraints starting from cells whose domains just changed.
    ///
    /// # Errors
    ///
    /// `PropagationError::Contradiction` as soon as any cell is left without
    /// a candidate module.
    fn propagate(
        &mut self,
        grid: &mut PossibilityGrid,
        origins: Vec<Position>,
        catalog: &ModuleCatalog,
    ) -> Result<PropagationStats, PropagationError>;
}
