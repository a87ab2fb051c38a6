//! The configuration engine: an immutable tree of values addressed by dotted paths.
//!
//! A [`Config`] wraps a `toml::Table` behind an `Arc`, so cloning is cheap and a
//! resolved config can be shared across threads freely. Every `get_*` accessor
//! fails with a path-carrying [`ConfigError`] when the value is missing or
//! cannot be coerced (see [`convert`](crate::convert) for the coercion rules).
//! The typed layer on top ([`TypedConfig`](crate::TypedConfig)) turns those
//! errors into absence.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::builder::ConfigBuilder;
use crate::convert;
use crate::error::ConfigError;
use crate::format;
use crate::merge;
use crate::resolve;
use crate::types::Format;
use crate::units::{ByteSize, Number};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    root: Arc<Table>,
}

/// Split a dotted path into its segments, rejecting empty ones.
pub(crate) fn split_path(path: &str) -> Result<Vec<&str>, ConfigError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::BadPath(path.to_string()));
    }
    Ok(segments)
}

/// Navigate a `toml::Table` by dotted path (e.g. `"database.url"`).
pub(crate) fn table_get<'a>(table: &'a Table, path: &str) -> Result<&'a Value, ConfigError> {
    let segments = split_path(path)?;
    let missing = || ConfigError::Missing(path.to_string());

    let (leaf, parents) = segments.split_last().ok_or_else(missing)?;
    let mut current = table;
    for segment in parents {
        current = current.get(*segment).and_then(Value::as_table).ok_or_else(missing)?;
    }
    current.get(*leaf).ok_or_else(missing)
}

impl Config {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_table(table: Table) -> Self {
        Self {
            root: Arc::new(table),
        }
    }

    /// Start a source-composition builder. See [`ConfigBuilder`].
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Parse TOML text.
    pub fn parse_str(text: &str) -> Result<Self, ConfigError> {
        format::parse(text, Format::Toml, "<string>").map(Self::from_table)
    }

    /// Parse JSON text. `null` values are dropped.
    #[cfg(feature = "json")]
    pub fn parse_json(text: &str) -> Result<Self, ConfigError> {
        format::parse(text, Format::Json, "<string>").map(Self::from_table)
    }

    /// Parse `key = value` properties text. Every value is stored as a string.
    pub fn parse_properties(text: &str) -> Self {
        Self::from_table(format::parse_properties(text))
    }

    pub fn root(&self) -> &Table {
        &self.root
    }

    pub fn into_table(self) -> Table {
        Arc::unwrap_or_clone(self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn has_path(&self, path: &str) -> bool {
        table_get(&self.root, path).is_ok()
    }

    fn lookup(&self, path: &str) -> Result<&Value, ConfigError> {
        table_get(&self.root, path)
    }

    /// The raw value at `path`, whatever its type.
    pub fn get_value(&self, path: &str) -> Result<Value, ConfigError> {
        self.lookup(path).cloned()
    }

    pub fn get_string(&self, path: &str) -> Result<String, ConfigError> {
        convert::to_string(self.lookup(path)?, path)
    }

    pub fn get_i32(&self, path: &str) -> Result<i32, ConfigError> {
        convert::to_i32(self.lookup(path)?, path)
    }

    pub fn get_i64(&self, path: &str) -> Result<i64, ConfigError> {
        convert::to_i64(self.lookup(path)?, path)
    }

    pub fn get_f64(&self, path: &str) -> Result<f64, ConfigError> {
        convert::to_f64(self.lookup(path)?, path)
    }

    pub fn get_bool(&self, path: &str) -> Result<bool, ConfigError> {
        convert::to_bool(self.lookup(path)?, path)
    }

    pub fn get_number(&self, path: &str) -> Result<Number, ConfigError> {
        convert::to_number(self.lookup(path)?, path)
    }

    pub fn get_duration(&self, path: &str) -> Result<Duration, ConfigError> {
        convert::to_duration(self.lookup(path)?, path)
    }

    pub fn get_byte_size(&self, path: &str) -> Result<ByteSize, ConfigError> {
        convert::to_byte_size(self.lookup(path)?, path)
    }

    /// The subtree at `path` as its own config.
    pub fn get_config(&self, path: &str) -> Result<Config, ConfigError> {
        convert::to_config(self.lookup(path)?, path)
    }

    pub fn get_enum<E: DeserializeOwned>(&self, path: &str) -> Result<E, ConfigError> {
        convert::to_enum(self.lookup(path)?, path)
    }

    fn list_ref(&self, path: &str) -> Result<&Vec<Value>, ConfigError> {
        match self.lookup(path)? {
            Value::Array(items) => Ok(items),
            other => Err(ConfigError::WrongType {
                path: path.to_string(),
                expected: "list",
                found: convert::type_name(other),
            }),
        }
    }

    /// Convert every element; the first failing element fails the whole list.
    fn list_of<T>(
        &self,
        path: &str,
        element: impl Fn(&Value, &str) -> Result<T, ConfigError>,
    ) -> Result<Vec<T>, ConfigError> {
        self.list_ref(path)?
            .iter()
            .enumerate()
            .map(|(i, item)| element(item, &format!("{path}[{i}]")))
            .collect()
    }

    pub fn get_list(&self, path: &str) -> Result<Vec<Value>, ConfigError> {
        self.list_ref(path).cloned()
    }

    pub fn get_string_list(&self, path: &str) -> Result<Vec<String>, ConfigError> {
        self.list_of(path, convert::to_string)
    }

    pub fn get_i32_list(&self, path: &str) -> Result<Vec<i32>, ConfigError> {
        self.list_of(path, convert::to_i32)
    }

    pub fn get_i64_list(&self, path: &str) -> Result<Vec<i64>, ConfigError> {
        self.list_of(path, convert::to_i64)
    }

    pub fn get_f64_list(&self, path: &str) -> Result<Vec<f64>, ConfigError> {
        self.list_of(path, convert::to_f64)
    }

    pub fn get_bool_list(&self, path: &str) -> Result<Vec<bool>, ConfigError> {
        self.list_of(path, convert::to_bool)
    }

    pub fn get_number_list(&self, path: &str) -> Result<Vec<Number>, ConfigError> {
        self.list_of(path, convert::to_number)
    }

    pub fn get_duration_list(&self, path: &str) -> Result<Vec<Duration>, ConfigError> {
        self.list_of(path, convert::to_duration)
    }

    pub fn get_byte_size_list(&self, path: &str) -> Result<Vec<ByteSize>, ConfigError> {
        self.list_of(path, convert::to_byte_size)
    }

    pub fn get_config_list(&self, path: &str) -> Result<Vec<Config>, ConfigError> {
        self.list_of(path, convert::to_config)
    }

    pub fn get_enum_list<E: DeserializeOwned>(&self, path: &str) -> Result<Vec<E>, ConfigError> {
        self.list_of(path, convert::to_enum::<E>)
    }

    /// Combine with `other`; keys present here win, `other` fills the gaps.
    pub fn with_fallback(&self, other: &Config) -> Config {
        if other.is_empty() {
            return self.clone();
        }
        Config::from_table(merge::with_fallback(&self.root, &other.root))
    }

    /// Expand `${path}` substitutions, falling back to process environment
    /// variables for paths the tree does not contain.
    pub fn resolve(&self) -> Result<Config, ConfigError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Like [`resolve`](Self::resolve) with an explicit environment lookup.
    pub fn resolve_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Config, ConfigError> {
        resolve::resolve_substitutions(&self.root, &env).map(Config::from_table)
    }

    /// Every leaf value as a `(dotted.path, value)` pair, in key order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        let mut out = Vec::new();
        collect_entries(&self.root, "", &mut out);
        out
    }

    /// A human-readable rendering of the whole tree, for diagnostics.
    pub fn render(&self) -> String {
        toml::to_string_pretty(&*self.root).unwrap_or_else(|_| format!("{:#?}", self.root))
    }
}

fn collect_entries(table: &Table, prefix: &str, out: &mut Vec<(String, Value)>) {
    for (key, value) in table {
        let dotted = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Table(sub) => collect_entries(sub, &dotted, out),
            leaf => out.push((dotted, leaf.clone())),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<Table> for Config {
    fn from(table: Table) -> Self {
        Config::from_table(table)
    }
}
