use crate::error::AppError;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use wfc_core::{CollapseStep, ModuleCatalog, PossibilityGrid, Position};

/// Saves the finished grid as text.
///
/// One line per grid row, module names separated by single spaces. Every
/// cell must be decided.
pub fn save_grid_to_file(
    grid: &PossibilityGrid,
    catalog: &ModuleCatalog,
    output_path: &Path,
) -> Result<()> {
    log::info!("Attempting to save grid to {:?}...", output_path);

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {:?}", output_path))?;
    let mut writer = io::BufWriter::new(file);

    for row in 0..grid.size() {
        let mut names = Vec::with_capacity(grid.size());
        for col in 0..grid.size() {
            let pos = Position::new(row, col);
            let Some(id) = grid.module_at(pos) else {
                bail!(
                    "Grid cell {} is not decided ({} possibilities), cannot save.",
                    pos,
                    grid.entropy(pos).unwrap_or(0)
                );
            };
            let module = catalog
                .get(id)
                .with_context(|| format!("Cell {pos} holds {id}, which is not in the catalog"))?;
            names.push(module.name.as_str());
        }
        writeln!(writer, "{}", names.join(" "))
            .with_context(|| format!("Failed to write row {row}"))?;
    }

    writer
        .flush()
        .context("Failed to flush writer for output file")?;
    log::info!("Successfully saved grid to {:?}", output_path);

    Ok(())
}

#[derive(Debug, Serialize)]
struct HistoryRecord<'a> {
    step: usize,
    row: usize,
    col: usize,
    module_index: usize,
    module_name: &'a str,
}

/// Writes one CSV row per collapse decision, in the order they were made.
pub fn write_history_csv(
    history: &[CollapseStep],
    catalog: &ModuleCatalog,
    path: &Path,
) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)?;
    for (index, step) in history.iter().enumerate() {
        let module_name = catalog
            .get(step.module)
            .map_or("", |module| module.name.as_str());
        writer.serialize(HistoryRecord {
            step: index + 1,
            row: step.position.row,
            col: step.position.col,
            module_index: step.module.0,
            module_name,
        })?;
    }
    writer.flush().map_err(csv::Error::from)?;
    log::info!("Wrote {} history rows to {:?}", history.len(), path);
    Ok(())
}
