use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing or unconvertible value at '{path}'")]
    MissingOrUnconvertible { path: String },

    #[error("No value at '{0}'")]
    Missing(String),

    #[error("Wrong type at '{path}': expected {expected}, found {found}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid value at '{path}': {reason}")]
    BadValue { path: String, reason: String },

    #[error("Invalid path '{0}' (empty segment)")]
    BadPath(String),

    #[error("Failed to parse {origin}: {source}")]
    ParseError {
        origin: String,
        source: toml::de::Error,
    },

    #[cfg(feature = "json")]
    #[error("Failed to parse {origin}: {source}")]
    JsonError {
        origin: String,
        source: serde_json::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Could not resolve substitution ${{{0}}}")]
    UnresolvedSubstitution(String),

    #[error("Circular substitution involving ${{{0}}}")]
    CircularSubstitution(String),

    #[error("Unclosed substitution in value at '{0}' (missing '}}')")]
    UnclosedSubstitution(String),

    #[error("Cannot interpolate non-scalar value ${{{0}}} into a string")]
    NonScalarSubstitution(String),

    #[error("Unknown keys in config: {}", .0.join(", "))]
    UnknownKeys(Vec<String>),

    #[error("Configuration error: {0}")]
    Schema(#[from] confique::Error),
}
