//! Setup module for the Tile Collapse application.
//!
//! Picks the visualizer for the configured mode and drives one complete
//! generation run.

pub mod execution;
pub mod visualization;
