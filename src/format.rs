//! Turn source text into a `toml::Table`, whatever its syntax.

use toml::Table;
#[cfg(feature = "json")]
use toml::Value;

use crate::error::ConfigError;
use crate::overrides;
use crate::types::Format;

/// Parse `text` as `format`. `origin` names the source in error messages.
pub fn parse(text: &str, format: Format, origin: &str) -> Result<Table, ConfigError> {
    match format {
        Format::Toml => text.parse::<Table>().map_err(|e| ConfigError::ParseError {
            origin: origin.to_string(),
            source: e,
        }),
        Format::Json => parse_json(text, origin),
        Format::Properties => Ok(parse_properties(text)),
    }
}

#[cfg(feature = "json")]
fn parse_json(text: &str, origin: &str) -> Result<Table, ConfigError> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ConfigError::JsonError {
            origin: origin.to_string(),
            source: e,
        })?;
    match json_to_toml(json) {
        Some(Value::Table(table)) => Ok(table),
        _ => Err(ConfigError::BadValue {
            path: origin.to_string(),
            reason: "JSON document must be an object".into(),
        }),
    }
}

#[cfg(not(feature = "json"))]
fn parse_json(_text: &str, origin: &str) -> Result<Table, ConfigError> {
    Err(ConfigError::BadValue {
        path: origin.to_string(),
        reason: "JSON support requires the `json` feature".into(),
    })
}

/// `null` has no TOML counterpart; it is dropped, which reads as "absent".
#[cfg(feature = "json")]
fn json_to_toml(json: serde_json::Value) -> Option<Value> {
    use serde_json::Value as Json;

    let value = match json {
        Json::Null => return None,
        Json::Bool(b) => Value::Boolean(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Float(n.as_f64()?),
        },
        Json::String(s) => Value::String(s),
        Json::Array(items) => Value::Array(items.into_iter().filter_map(json_to_toml).collect()),
        Json::Object(map) => Value::Table(
            map.into_iter()
                .filter_map(|(k, v)| json_to_toml(v).map(|v| (k, v)))
                .collect(),
        ),
    };
    Some(value)
}

/// Parse properties text: one `key = value` (or `key: value`) per line,
/// `#` and `!` start comments, dotted keys nest.
pub fn parse_properties(text: &str) -> Table {
    let mut table = Table::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some(split) = line.find(['=', ':']) else {
            continue;
        };
        let key = line[..split].trim();
        let value = line[split + 1..].trim();
        if key.is_empty() {
            continue;
        }
        overrides::insert_dotted(&mut table, key, toml::Value::String(value.to_string()));
    }
    table
}
