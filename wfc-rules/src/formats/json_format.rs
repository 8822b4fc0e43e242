use crate::formats::FormatParser;
use crate::{LoadError, ModuleRecord};

/// Parser for the JSON catalog layout: a top-level array of
/// `{ "module_name", "sprite_name", "neighbors" }` objects.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatParser;

impl JsonFormatParser {
    pub fn new() -> Self {
        Self
    }
}

impl FormatParser for JsonFormatParser {
    fn format_name(&self) -> &'static str {
        "JSON"
    }

    fn parse(&self, content: &str) -> Result<Vec<ModuleRecord>, LoadError> {
        serde_json::from_str(content).map_err(|e| LoadError::ParseError {
            format: self.format_name(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_in_order() {
        let content = r#"[
            { "module_name": "grass", "sprite_name": "grass.png", "neighbors": ["sand"] },
            { "module_name": "sand", "sprite_name": "sand.png", "neighbors": ["grass", "water"] },
            { "module_name": "water", "sprite_name": "water.png" }
        ]"#;
        let records = JsonFormatParser::new().parse(content).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].module_name, "grass");
        assert_eq!(records[1].neighbors, vec!["grass", "water"]);
        assert!(records[2].neighbors.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let content = r#"[{ "module_name": "grass", "neighbors": [] }]"#;
        let err = JsonFormatParser::new().parse(content).unwrap_err();
        assert!(matches!(err, LoadError::ParseError { format: "JSON", .. }));
    }
}
