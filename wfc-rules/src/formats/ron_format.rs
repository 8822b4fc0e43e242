use crate::formats::FormatParser;
use crate::{LoadError, ModuleRecord};
use serde::Deserialize;

/// A parser implementation for RON (Rusty Object Notation) catalogs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RonFormatParser;

impl RonFormatParser {
    /// Creates a new RON format parser
    pub fn new() -> Self {
        Self
    }
}

/// Top-level RON layout. Used internally for deserialization.
#[derive(Debug, Deserialize)]
struct RonCatalogFile {
    modules: Vec<ModuleRecord>,
}

impl FormatParser for RonFormatParser {
    fn format_name(&self) -> &'static str {
        "Rusty Object Notation (RON)"
    }

    fn parse(&self, ron_content: &str) -> Result<Vec<ModuleRecord>, LoadError> {
        let file: RonCatalogFile = ron::from_str(ron_content).map_err(|e| LoadError::ParseError {
            format: self.format_name(),
            message: format!("RON deserialization failed: {e}"),
        })?;
        Ok(file.modules)
    }
}
