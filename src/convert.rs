//! Scalar coercions from stored `toml::Value`s to the types the engine hands out.
//!
//! Every converter takes the path of the value only to build its error.

use std::time::Duration;

use toml::Value;

use crate::config::Config;
use crate::error::ConfigError;
use crate::units::{self, ByteSize, Number};

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Integer(_) => "integer",
        Value::Float(_) => "float",
        Value::Boolean(_) => "boolean",
        Value::Datetime(_) => "datetime",
        Value::Array(_) => "list",
        Value::Table(_) => "object",
    }
}

fn wrong_type(path: &str, expected: &'static str, value: &Value) -> ConfigError {
    ConfigError::WrongType {
        path: path.to_string(),
        expected,
        found: type_name(value),
    }
}

fn bad_value(path: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::BadValue {
        path: path.to_string(),
        reason: reason.into(),
    }
}

pub fn to_string(value: &Value, path: &str) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(d) => Ok(d.to_string()),
        other => Err(wrong_type(path, "string", other)),
    }
}

pub fn to_number(value: &Value, path: &str) -> Result<Number, ConfigError> {
    match value {
        Value::Integer(i) => Ok(Number::Integer(*i)),
        Value::Float(f) => Ok(Number::Float(*f)),
        Value::String(s) => units::parse_number(s).ok_or_else(|| wrong_type(path, "number", value)),
        other => Err(wrong_type(path, "number", other)),
    }
}

pub fn to_i64(value: &Value, path: &str) -> Result<i64, ConfigError> {
    to_number(value, path)?
        .as_i64()
        .ok_or_else(|| bad_value(path, "is not a whole number in the 64-bit integer range"))
}

pub fn to_i32(value: &Value, path: &str) -> Result<i32, ConfigError> {
    let wide = to_i64(value, path)?;
    i32::try_from(wide).map_err(|_| bad_value(path, format!("{wide} is out of range for a 32-bit integer")))
}

pub fn to_f64(value: &Value, path: &str) -> Result<f64, ConfigError> {
    to_number(value, path).map(Number::as_f64)
}

pub fn to_bool(value: &Value, path: &str) -> Result<bool, ConfigError> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => Ok(true),
            "false" | "no" | "off" => Ok(false),
            _ => Err(wrong_type(path, "boolean", value)),
        },
        other => Err(wrong_type(path, "boolean", other)),
    }
}

pub fn to_duration(value: &Value, path: &str) -> Result<Duration, ConfigError> {
    match value {
        Value::Integer(ms) if *ms >= 0 => Ok(Duration::from_millis(*ms as u64)),
        Value::Integer(_) => Err(bad_value(path, "duration is negative")),
        Value::String(s) => units::parse_duration(s).map_err(|reason| bad_value(path, reason)),
        other => Err(wrong_type(path, "duration", other)),
    }
}

pub fn to_byte_size(value: &Value, path: &str) -> Result<ByteSize, ConfigError> {
    match value {
        Value::Integer(n) if *n >= 0 => Ok(ByteSize(*n as u64)),
        Value::Integer(_) => Err(bad_value(path, "size is negative")),
        Value::String(s) => units::parse_byte_size(s).map_err(|reason| bad_value(path, reason)),
        other => Err(wrong_type(path, "size in bytes", other)),
    }
}

pub fn to_config(value: &Value, path: &str) -> Result<Config, ConfigError> {
    match value {
        Value::Table(t) => Ok(Config::from_table(t.clone())),
        other => Err(wrong_type(path, "object", other)),
    }
}

/// Convert a stored string into an enum variant through serde.
pub fn to_enum<E: serde::de::DeserializeOwned>(value: &Value, path: &str) -> Result<E, ConfigError> {
    match value {
        Value::String(_) => value.clone().try_into().map_err(|e: toml::de::Error| {
            bad_value(path, format!("no matching variant: {e}"))
        }),
        other => Err(wrong_type(path, "enum name", other)),
    }
}
