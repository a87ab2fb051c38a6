//! Keys a confique schema doesn't declare.
//!
//! The tree is deserialized into `C::Layer`, whose fields are all optional,
//! while `serde_ignored` records every key the layer skipped.

use confique::Config as Schema;
use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::error::ConfigError;

/// Dotted paths of every key in `table` that schema `C` does not declare.
pub fn unknown_keys<C: Schema>(table: &Table) -> Result<Vec<String>, ConfigError>
where
    C::Layer: DeserializeOwned,
{
    let mut unknown: Vec<String> = Vec::new();

    let _layer: C::Layer = serde_ignored::deserialize(Value::Table(table.clone()), |ignored| {
        unknown.push(ignored.to_string());
    })
    .map_err(|e: toml::de::Error| ConfigError::BadValue {
        path: "<root>".into(),
        reason: e.to_string(),
    })?;

    Ok(unknown)
}
