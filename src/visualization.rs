use anyhow::{Context, Result};
use colored::{Color, Colorize};
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};
use wfc_core::{ModuleCatalog, ModuleId, PossibilityGrid};

/// Trait for types that can visualize the state of the WFC `PossibilityGrid`.
///
/// Visualizers only ever see the grid through a shared borrow, once per
/// iteration, and map decided modules back to the catalog for drawing.
pub trait Visualizer {
    /// Displays or updates the visualization for the current grid state.
    fn display_state(&mut self, grid: &PossibilityGrid, catalog: &ModuleCatalog) -> Result<()>;
}

/// Draws nothing. Used when visualization is disabled.
#[derive(Debug, Default)]
pub struct NoopVisualizer;

impl Visualizer for NoopVisualizer {
    fn display_state(&mut self, _grid: &PossibilityGrid, _catalog: &ModuleCatalog) -> Result<()> {
        Ok(())
    }
}

const PALETTE: [Color; 6] = [
    Color::Blue,
    Color::Yellow,
    Color::Green,
    Color::Red,
    Color::Magenta,
    Color::Cyan,
];

const UNDECIDED: char = '·';

/// Renders the grid as text, one character per cell.
///
/// A decided cell shows the first letter of its module name in a color
/// picked by module index; an undecided cell shows `·`.
pub struct TerminalVisualizer<W: Write = io::Stdout> {
    out: W,
    frame: u64,
}

impl TerminalVisualizer {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for TerminalVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalVisualizer<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out, frame: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn glyph(catalog: &ModuleCatalog, module: ModuleId) -> String {
        let letter = catalog
            .get(module)
            .and_then(|m| m.name.chars().next())
            .unwrap_or('?');
        letter
            .to_string()
            .as_str()
            .color(PALETTE[module.0 % PALETTE.len()])
            .to_string()
    }
}

impl<W: Write> Visualizer for TerminalVisualizer<W> {
    fn display_state(&mut self, grid: &PossibilityGrid, catalog: &ModuleCatalog) -> Result<()> {
        let size = grid.size();
        let mut cells: Vec<Option<ModuleId>> = vec![None; grid.total_cells()];
        for (pos, module) in grid.collapsed_cells() {
            cells[pos.row * size + pos.col] = Some(module);
        }

        self.frame += 1;
        let mut frame = format!(
            "--- Frame {} ({}/{} decided) ---\n",
            self.frame,
            grid.collapsed_count(),
            grid.total_cells()
        );
        if !grid.is_empty() {
            for row in cells.chunks(size) {
                for cell in row {
                    match cell {
                        Some(module) => frame.push_str(&Self::glyph(catalog, *module)),
                        None => {
                            frame.push_str(&UNDECIDED.to_string().as_str().dimmed().to_string());
                        }
                    }
                }
                frame.push('\n');
            }
        }

        self.out
            .write_all(frame.as_bytes())
            .and_then(|()| self.out.flush())
            .context("Failed to write frame to terminal")
    }
}

/// Sleeps between frames so that consecutive frames are at least
/// `interval` apart.
#[derive(Debug)]
pub struct FramePacer {
    interval: Option<Duration>,
    last_frame: Option<Instant>,
}

impl FramePacer {
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            last_frame: None,
        }
    }

    /// Blocks until the frame budget is used up, then starts a new frame.
    pub fn wait(&mut self) {
        if let (Some(interval), Some(last)) = (self.interval, self.last_frame) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                thread::sleep(interval - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());
    }
}
