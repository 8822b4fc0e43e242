use crate::formats::{FormatParser, JsonFormatParser, RonFormatParser};
use crate::{LoadError, ModuleCatalog, SymmetryPolicy};
use std::fs;
use std::path::Path;

/// Picks a parser from the file extension (`json` or `ron`).
///
/// # Errors
///
/// Returns `LoadError::UnsupportedFormat` for any other extension.
pub fn parser_for_path(path: &Path) -> Result<Box<dyn FormatParser>, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => Ok(Box::new(JsonFormatParser::new())),
        Some("ron") => Ok(Box::new(RonFormatParser::new())),
        _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Loads and validates a module catalog from a file.
///
/// # Arguments
///
/// * `path` - The catalog file (`.json` or `.ron`).
/// * `policy` - How declared adjacency is symmetrized or checked.
///
/// # Errors
///
/// Any [`LoadError`]: unreadable file, unsupported extension, malformed
/// content, or a catalog that fails validation.
pub fn load_from_file(path: &Path, policy: SymmetryPolicy) -> Result<ModuleCatalog, LoadError> {
    let parser = parser_for_path(path)?;
    let content = fs::read_to_string(path)?;
    log::info!(
        "Loading module catalog from {:?} ({})",
        path,
        parser.format_name()
    );
    load_from_str(parser.as_ref(), &content, policy)
}

/// Parses `content` with `parser` and builds the catalog.
///
/// # Errors
///
/// See [`load_from_file`].
pub fn load_from_str(
    parser: &dyn FormatParser,
    content: &str,
    policy: SymmetryPolicy,
) -> Result<ModuleCatalog, LoadError> {
    let records = parser.parse(content)?;
    ModuleCatalog::load_with_policy(&records, policy)
}
