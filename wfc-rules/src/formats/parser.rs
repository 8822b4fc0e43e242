use crate::{LoadError, ModuleRecord};

/// Trait defining the interface for format-specific catalog parsers.
///
/// A parser only turns text into ordered [`ModuleRecord`]s; name resolution
/// and validation happen when the records are turned into a catalog.
pub trait FormatParser {
    /// Parses catalog content into module records, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::ParseError` if the content is malformed.
    fn parse(&self, content: &str) -> Result<Vec<ModuleRecord>, LoadError>;

    /// Returns a descriptive name for this parser format.
    ///
    /// Used in log lines and error messages.
    fn format_name(&self) -> &'static str;
}
