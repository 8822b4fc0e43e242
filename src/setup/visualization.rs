//! Builds the visualizer for the configured mode.

use crate::config::{Settings, VisualizationMode};
use crate::visualization::{NoopVisualizer, TerminalVisualizer, Visualizer};

/// Returns the visualizer matching `settings.visualization_mode`.
pub fn setup_visualization(settings: &Settings) -> Box<dyn Visualizer> {
    match settings.visualization_mode {
        VisualizationMode::None => Box::new(NoopVisualizer),
        VisualizationMode::Terminal => {
            let interval = settings.frame_interval.map_or_else(
                || "none".to_string(),
                |d| humantime::format_duration(d).to_string(),
            );
            log::info!("Terminal visualization enabled (frame interval: {interval})");
            Box::new(TerminalVisualizer::new())
        }
    }
}
