//! Bind a config tree to a confique struct.
//!
//! Steps:
//!
//! 1. Reject keys the struct doesn't declare (skipped by `bind_lenient`)
//! 2. Deserialize the tree into `C::Layer`
//! 3. Let confique fill `#[config(default)]` values and check required fields

use confique::Config as Schema;
use serde::de::DeserializeOwned;
use toml::Value;

use crate::config::Config;
use crate::error::ConfigError;
use crate::validate;

impl Config {
    /// Bind the whole tree to `C`. Unknown keys are an error listing them all.
    ///
    /// To bind a section, bind its subtree: `config.get_config("db")?.bind::<Db>()`.
    pub fn bind<C: Schema>(&self) -> Result<C, ConfigError>
    where
        C::Layer: DeserializeOwned,
    {
        let unknown = validate::unknown_keys::<C>(self.root())?;
        if !unknown.is_empty() {
            return Err(ConfigError::UnknownKeys(unknown));
        }
        self.bind_lenient()
    }

    /// Bind the whole tree to `C`, ignoring keys `C` doesn't declare.
    pub fn bind_lenient<C: Schema>(&self) -> Result<C, ConfigError>
    where
        C::Layer: DeserializeOwned,
    {
        let layer: C::Layer = Value::Table(self.root().clone())
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::BadValue {
                path: "<root>".into(),
                reason: e.to_string(),
            })?;

        C::builder()
            .preloaded(layer)
            .load()
            .map_err(ConfigError::from)
    }
}
