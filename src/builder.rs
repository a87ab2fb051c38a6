use std::path::Path;
use std::sync::Arc;

use toml::Value;
use tracing::info;

use crate::config::Config;
use crate::env::EnvSource;
use crate::error::ConfigError;
use crate::evaluator::EvaluatorRegistry;
use crate::file::FileSource;
use crate::source::{self, ConfigProvider, OverrideSource, TextSource};
use crate::typed::TypedConfig;
use crate::types::Format;

/// Builder for assembling a configuration from ordered sources.
///
/// Sources are listed in **priority-descending** order: the first one added
/// wins on overlapping keys, later ones only fill gaps. Substitutions are
/// resolved once, after every source has been merged, so a `${ref}` in one
/// source may point at a key supplied by another.
///
/// ```
/// use typedconf::Config;
///
/// let config = Config::builder()
///     .set("server.port", 9000)
///     .add_text("[server]\nport = 8080\nhost = \"localhost\"\n")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.get_i64("server.port").unwrap(), 9000);
/// assert_eq!(config.get_string("server.host").unwrap(), "localhost");
/// ```
#[must_use]
pub struct ConfigBuilder {
    providers: Vec<Box<dyn ConfigProvider>>,
    pending: OverrideSource,
    resolve: bool,
    registry: Option<Arc<EvaluatorRegistry>>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            pending: OverrideSource::new(),
            resolve: true,
            registry: None,
        }
    }

    /// Append any provider, including a closure returning a `Config`.
    pub fn add<P: ConfigProvider + 'static>(mut self, provider: P) -> Self {
        self.flush_overrides();
        self.providers.push(Box::new(provider));
        self
    }

    /// Append inline TOML.
    pub fn add_text(self, text: &str) -> Self {
        self.add(TextSource::toml(text))
    }

    /// Append inline JSON.
    #[cfg(feature = "json")]
    pub fn add_json(self, text: &str) -> Self {
        self.add(TextSource::new(text, Format::Json))
    }

    /// Append inline `key = value` properties. Every value is a string.
    pub fn add_properties(self, text: &str) -> Self {
        self.add(TextSource::new(text, Format::Properties))
    }

    /// Append a file that must exist. The format follows the extension.
    pub fn add_file(self, path: impl AsRef<Path>) -> Self {
        self.add(FileSource::required(path))
    }

    /// Append a file that contributes nothing when absent.
    pub fn add_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.add(FileSource::optional(path))
    }

    /// Append `file_name` from the platform config directory for `app_name`.
    pub fn add_platform_file(self, app_name: &str, file_name: &str) -> Self {
        self.add(FileSource::platform(app_name, file_name))
    }

    /// Append environment variables named `{prefix}__SECTION__KEY`.
    pub fn add_env(self, prefix: &str) -> Self {
        self.add(EnvSource::new(prefix))
    }

    /// Set a single value by dotted path.
    ///
    /// Consecutive `set` calls form one source, ranked where the first of
    /// them was made. Among themselves, the last write for a path wins.
    pub fn set<V: Into<Value>>(mut self, path: &str, value: V) -> Self {
        self.pending = std::mem::take(&mut self.pending).set(path, value);
        self
    }

    /// Skip substitution resolution; `${...}` stays as literal text.
    pub fn no_resolve(mut self) -> Self {
        self.resolve = false;
        self
    }

    /// Evaluator registry for [`build_typed`](Self::build_typed) (default: the global one).
    pub fn registry(mut self, registry: Arc<EvaluatorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    fn flush_overrides(&mut self) {
        if !self.pending.is_empty() {
            let overrides = std::mem::take(&mut self.pending);
            self.providers.push(Box::new(overrides));
        }
    }

    /// Load, merge and (unless disabled) resolve every source.
    pub fn build(mut self) -> Result<Config, ConfigError> {
        self.flush_overrides();
        let providers = self
            .providers
            .iter()
            .map(|p| -> &dyn ConfigProvider { p.as_ref() });
        let config = if self.resolve {
            source::build(providers)?
        } else {
            source::merge_all(providers)?
        };
        info!(
            sources = self.providers.len(),
            keys = config.root().len(),
            "configuration built"
        );
        Ok(config)
    }

    /// [`build`](Self::build), then wrap the result for typed lookups.
    pub fn build_typed(self) -> Result<TypedConfig, ConfigError> {
        let registry = self
            .registry
            .clone()
            .unwrap_or_else(EvaluatorRegistry::global);
        Ok(TypedConfig::with_registry(self.build()?, registry))
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
