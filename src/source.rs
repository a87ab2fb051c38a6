//! Configuration providers and the fold that combines them.
//!
//! A provider produces one raw (unresolved) snapshot. [`build`] folds an
//! ordered list of them with fallback-merge, so the **first** provider wins on
//! overlapping keys, then resolves substitutions once over the merged tree.
//! References may therefore point across sources.

use toml::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::ConfigError;
use crate::format;
use crate::overrides;
use crate::types::Format;

/// A source of one raw configuration snapshot.
///
/// Any `Fn() -> Result<Config, ConfigError>` closure is a provider. Sources
/// that may legitimately be absent should return [`Config::empty`] rather
/// than an error.
pub trait ConfigProvider: Send + Sync {
    fn load(&self) -> Result<Config, ConfigError>;

    /// A short human-readable name, for logs.
    fn describe(&self) -> String {
        "custom provider".to_string()
    }
}

impl<F> ConfigProvider for F
where
    F: Fn() -> Result<Config, ConfigError> + Send + Sync,
{
    fn load(&self) -> Result<Config, ConfigError> {
        self()
    }
}

/// Inline configuration text.
#[derive(Debug, Clone)]
pub struct TextSource {
    text: String,
    format: Format,
}

impl TextSource {
    pub fn new(text: impl Into<String>, format: Format) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }

    pub fn toml(text: impl Into<String>) -> Self {
        Self::new(text, Format::Toml)
    }
}

impl ConfigProvider for TextSource {
    fn load(&self) -> Result<Config, ConfigError> {
        format::parse(&self.text, self.format, "inline text").map(Config::from_table)
    }

    fn describe(&self) -> String {
        format!("inline {:?}", self.format)
    }
}

/// Programmatic values addressed by dotted path.
#[derive(Debug, Clone, Default)]
pub struct OverrideSource {
    entries: Vec<(String, Value)>,
}

impl OverrideSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries for the same path win.
    pub fn set<V: Into<Value>>(mut self, path: &str, value: V) -> Self {
        self.entries.push((path.to_string(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigProvider for OverrideSource {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(Config::from_table(overrides::expand(&self.entries)))
    }

    fn describe(&self) -> String {
        format!("{} override(s)", self.entries.len())
    }
}

/// Fold providers left to right with fallback-merge (first wins), then
/// resolve substitutions.
pub fn build<'a>(
    providers: impl IntoIterator<Item = &'a dyn ConfigProvider>,
) -> Result<Config, ConfigError> {
    merge_all(providers)?.resolve()
}

/// The fold without the final resolution step.
pub fn merge_all<'a>(
    providers: impl IntoIterator<Item = &'a dyn ConfigProvider>,
) -> Result<Config, ConfigError> {
    let mut merged = Config::empty();
    for provider in providers {
        let snapshot = provider.load()?;
        debug!(
            source = %provider.describe(),
            keys = snapshot.root().len(),
            "merged configuration source"
        );
        merged = merged.with_fallback(&snapshot);
    }
    Ok(merged)
}
