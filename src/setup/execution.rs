//! Handles the execution of a single generation run.

use crate::{
    config::Settings,
    error::AppError,
    output,
    progress::{LogProgressReporter, ProgressReporter},
    setup::visualization::setup_visualization,
    visualization::FramePacer,
};
use log::{debug, error, info, warn};
use wfc_core::{PossibilityGrid, RunReport, Solver, WfcConfig, WfcError};
use wfc_rules::loader::load_from_file;

/// Loads the catalog, generates one grid and writes the requested outputs.
///
/// The catalog is fully validated before any grid is allocated.
pub fn run_standard_mode(settings: &Settings) -> Result<RunReport, AppError> {
    let catalog = load_from_file(&settings.catalog, settings.symmetry).map_err(|e| {
        error!("Failed to load catalog {:?}: {}", settings.catalog, e);
        AppError::Catalog(e)
    })?;
    info!(
        "Catalog loaded: {} modules ({} symmetry)",
        catalog.len(),
        settings.symmetry
    );
    for module in catalog.iter() {
        debug!(
            "  {} = {} ({} neighbors)",
            module.id,
            module.name,
            module.neighbors.count_ones()
        );
    }

    info!(
        "Initializing grid: {}x{}",
        settings.grid_size, settings.grid_size
    );
    let mut grid = PossibilityGrid::new(settings.grid_size, catalog.len());

    let mut builder = WfcConfig::builder().depth_limit(settings.depth_limit);
    if let Some(seed) = settings.seed {
        builder = builder.seed(seed);
    }
    if let Some(max_iterations) = settings.max_iterations {
        builder = builder.max_iterations(max_iterations);
    }
    let config = builder.build();

    let mut visualizer = setup_visualization(settings);
    let mut pacer = FramePacer::new(settings.frame_interval);
    let mut reporter = settings
        .report_progress_interval
        .map(|interval| LogProgressReporter::new(interval, settings.progress_log_level));

    let (seed, result) = {
        let mut solver = Solver::new(&mut grid, &catalog, &config)?;
        let seed = solver.seed();
        info!(
            "Running WFC with seed {} and depth limit {}",
            seed, settings.depth_limit
        );
        let result = solver.run(|info| {
            visualizer
                .display_state(info.grid, &catalog)
                .map_err(|e| WfcError::Observer(e.to_string()))?;
            if let Some(reporter) = reporter.as_mut() {
                reporter
                    .report(info)
                    .map_err(|e| WfcError::Observer(e.to_string()))?;
            }
            pacer.wait();
            Ok(())
        });
        (seed, result)
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            if let Some(reporter) = reporter.as_mut() {
                if let Err(report_err) = reporter.fail(&e) {
                    warn!("Progress reporter failed: {}", report_err);
                }
            }
            match &e {
                WfcError::Contradiction(pos) => {
                    error!("Contradiction at {} (seed {}); no grid written", pos, seed);
                }
                other => error!("WFC failed (seed {}): {}", seed, other),
            }
            return Err(e.into());
        }
    };

    if let Some(reporter) = reporter.as_mut() {
        reporter.finish(&report)?;
    }
    info!(
        "WFC completed successfully: {} iterations in {:.2?}, seed {}, deepest propagation {}",
        report.iterations, report.elapsed, report.seed, report.max_propagation_depth
    );

    if let Some(path) = &settings.output_path {
        info!("Saving final grid to: {}", path.display());
        output::save_grid_to_file(&grid, &catalog, path)?;
    } else {
        info!("Output path not specified, skipping save.");
    }
    if let Some(path) = &settings.history_csv {
        output::write_history_csv(&report.history, &catalog, path)?;
    }

    Ok(report)
}
