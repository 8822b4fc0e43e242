//! Tile Collapse application library.
//!
//! Configuration, logging, progress reporting, visualization and output
//! around the `wfc-core` solver.

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod setup;
pub mod visualization;

pub use config::{AppConfig, Settings};
pub use error::AppError;

/// Resolves settings for `cli`, sets up logging and performs one run.
pub fn run(cli: &AppConfig) -> Result<(), AppError> {
    let settings = Settings::load(cli)?;
    logging::init_logger(&settings);
    log::debug!("Resolved settings: {:?}", settings);

    setup::execution::run_standard_mode(&settings).map(|_| ())
}
