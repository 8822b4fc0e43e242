use thiserror::Error;
use wfc_core::WfcError;
use wfc_rules::LoadError;

/// Exit status for a catalog that cannot be loaded or resolved.
pub const EXIT_CATALOG_ERROR: i32 = 84;
/// Exit status when the run ends in a contradiction.
pub const EXIT_CONTRADICTION: i32 = 3;
/// Exit status for invalid settings. Matches clap's usage-error status.
pub const EXIT_CONFIG_ERROR: i32 = 2;
pub const EXIT_FAILURE: i32 = 1;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Settings Error: {0}")]
    Settings(#[from] figment::Error),

    #[error("Catalog Error: {0}")]
    Catalog(#[from] LoadError),

    #[error("WFC Core Error: {0}")]
    WfcCore(#[from] WfcError),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Catalog(_) => EXIT_CATALOG_ERROR,
            Self::WfcCore(WfcError::Contradiction(_)) => EXIT_CONTRADICTION,
            Self::Config(_) | Self::Settings(_) => EXIT_CONFIG_ERROR,
            _ => EXIT_FAILURE,
        }
    }
}
