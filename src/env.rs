//! Environment variables as a configuration provider.
//!
//! With prefix `MYAPP`, variables map through double-underscore nesting:
//!
//! | Env var | Config path |
//! |---------|-------------|
//! | `MYAPP__HOST` | `host` |
//! | `MYAPP__DB__MAX_CONNECTIONS` | `db.max_connections` |

use toml::{Table, Value};

use crate::config::Config;
use crate::error::ConfigError;
use crate::overrides;
use crate::source::ConfigProvider;
use crate::units::{self, Number};

const SEPARATOR: &str = "__";

/// Provider reading `{PREFIX}__*` variables.
///
/// Reads the process environment on every [`load`](ConfigProvider::load)
/// unless constructed with [`from_vars`](EnvSource::from_vars).
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    vars: Option<Vec<(String, String)>>,
}

impl EnvSource {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            vars: None,
        }
    }

    /// Use a fixed set of variables instead of the process environment.
    pub fn from_vars(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            prefix: prefix.to_string(),
            vars: Some(vars.into_iter().collect()),
        }
    }
}

impl ConfigProvider for EnvSource {
    fn load(&self) -> Result<Config, ConfigError> {
        let table = match &self.vars {
            Some(vars) => env_to_table(&self.prefix, vars.iter().cloned()),
            None => env_to_table(&self.prefix, std::env::vars()),
        };
        Ok(Config::from_table(table))
    }

    fn describe(&self) -> String {
        format!("environment ({}{SEPARATOR}*)", self.prefix)
    }
}

/// Collect `{prefix}__*` variables into a table.
///
/// `__` separates path segments and segments are lowercased, so
/// `APP__DB__MAX_CONNECTIONS` lands at `db.max_connections`. Variables with an
/// empty segment are skipped. When a variable and a deeper one collide
/// (`APP__DB` and `APP__DB__URL`) the section wins.
pub fn env_to_table(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Table {
    let needle = format!("{prefix}{SEPARATOR}");

    let mut entries: Vec<(Vec<String>, Value)> = vars
        .into_iter()
        .filter_map(|(name, raw)| {
            let segments: Vec<String> = name
                .strip_prefix(&needle)?
                .split(SEPARATOR)
                .map(str::to_lowercase)
                .collect();
            let well_formed = segments.iter().all(|s| !s.is_empty() && !s.contains('.'));
            well_formed.then(|| (segments, typed_value(&raw)))
        })
        .collect();

    // Shallow first: a deeper path then replaces any scalar in its way.
    entries.sort_by_key(|(segments, _)| segments.len());

    let mut table = Table::new();
    for (segments, value) in entries {
        overrides::insert_dotted(&mut table, &segments.join("."), value);
    }
    table
}

/// `true`/`false` (any case), then integers, then decimals, else the raw text.
fn typed_value(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false") {
        return Value::Boolean(raw.eq_ignore_ascii_case("true"));
    }
    match units::parse_number(raw) {
        Some(Number::Integer(i)) => Value::Integer(i),
        // Only decimals become floats, so "1e5"-looking ids stay strings.
        Some(Number::Float(f)) if raw.contains('.') => Value::Float(f),
        _ => Value::String(raw.to_string()),
    }
}
