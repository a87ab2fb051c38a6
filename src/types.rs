//! Small public enums shared across the crate.

use std::path::Path;

/// Syntax of a configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Toml,
    /// JSON text. Requires the `json` feature.
    Json,
    /// Java-style `key = value` lines with dotted keys.
    Properties,
}

impl Format {
    /// Guess the format from a file extension; unknown extensions are TOML.
    pub fn from_path(path: &Path) -> Format {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Format::Json,
            Some("properties") => Format::Properties,
            _ => Format::Toml,
        }
    }
}

/// When a custom evaluator runs relative to built-in type handling.
///
/// ```text
/// PreBuiltin   evaluators        may shadow built-in types
/// (built-in dispatch)
/// PostBuiltin  evaluators        default tier
/// (enum / list-of-enum)
/// Fallback     evaluators        last resort
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tier {
    PreBuiltin,
    #[default]
    PostBuiltin,
    Fallback,
}
