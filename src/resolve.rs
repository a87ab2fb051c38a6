//! Substitution resolution: expand `${path}` references inside a config tree.
//!
//! - `${a.b}` as the whole value takes the referenced value with its type
//!   (a table, a list, an integer, ...).
//! - `${a.b}` inside a longer string must reference a scalar and is
//!   interpolated as text.
//! - A path the tree does not contain falls back to the environment variable
//!   of the same name.
//! - `${?a.b}` is optional: when unresolvable, a whole-value reference removes
//!   the key (or list element), an embedded one becomes empty text.
//! - `$$` produces a literal `$`.
//!
//! Targets are read from the unresolved tree and resolved on demand, so
//! references may chain. A reference that reaches itself again is a cycle.

use toml::{Table, Value};
use tracing::trace;

use crate::config::{split_path, table_get};
use crate::error::ConfigError;

/// Resolve every substitution in `root`. `env` supplies environment fallbacks.
pub fn resolve_substitutions(
    root: &Table,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<Table, ConfigError> {
    let mut resolver = Resolver {
        root,
        env,
        in_progress: Vec::new(),
    };
    resolver.resolve_table(root, "")
}

#[derive(Debug, PartialEq)]
enum Piece {
    Text(String),
    Ref { path: String, optional: bool },
}

/// Split a string into literal text and references. `at` is the path of the
/// value being scanned, for error messages.
fn tokenize(s: &str, at: &str) -> Result<Vec<Piece>, ConfigError> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            text.push(ch);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                text.push('$');
            }
            Some('{') => {
                chars.next();
                let mut inner = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    inner.push(c);
                }
                if !closed {
                    return Err(ConfigError::UnclosedSubstitution(at.to_string()));
                }
                let (optional, path) = match inner.trim().strip_prefix('?') {
                    Some(rest) => (true, rest.trim().to_string()),
                    None => (false, inner.trim().to_string()),
                };
                if path.is_empty() {
                    return Err(ConfigError::BadPath(format!("${{{inner}}}")));
                }
                if !text.is_empty() {
                    pieces.push(Piece::Text(std::mem::take(&mut text)));
                }
                pieces.push(Piece::Ref { path, optional });
            }
            _ => text.push('$'),
        }
    }

    if !text.is_empty() {
        pieces.push(Piece::Text(text));
    }
    Ok(pieces)
}

struct Resolver<'a> {
    root: &'a Table,
    env: &'a dyn Fn(&str) -> Option<String>,
    /// Reference targets currently being resolved, innermost last.
    in_progress: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn resolve_table(&mut self, table: &'a Table, prefix: &str) -> Result<Table, ConfigError> {
        let mut out = Table::new();
        for (key, value) in table {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            if let Some(resolved) = self.resolve_value(value, &path)? {
                out.insert(key.clone(), resolved);
            }
        }
        Ok(out)
    }

    /// `Ok(None)` means the value was an unresolvable optional reference.
    fn resolve_value(&mut self, value: &'a Value, path: &str) -> Result<Option<Value>, ConfigError> {
        match value {
            Value::String(s) => self.resolve_string(s, path),
            Value::Table(t) => self.resolve_table(t, path).map(|t| Some(Value::Table(t))),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    if let Some(resolved) = self.resolve_value(item, &format!("{path}[{i}]"))? {
                        out.push(resolved);
                    }
                }
                Ok(Some(Value::Array(out)))
            }
            other => Ok(Some(other.clone())),
        }
    }

    fn resolve_string(&mut self, s: &str, path: &str) -> Result<Option<Value>, ConfigError> {
        if !s.contains('$') {
            return Ok(Some(Value::String(s.to_string())));
        }

        let pieces = tokenize(s, path)?;
        if let [Piece::Ref { path: target, optional }] = pieces.as_slice() {
            return self.lookup(target, *optional);
        }

        let mut out = String::new();
        for piece in pieces {
            match piece {
                Piece::Text(text) => out.push_str(&text),
                Piece::Ref { path: target, optional } => {
                    if let Some(value) = self.lookup(&target, optional)? {
                        out.push_str(&scalar_text(&value, &target)?);
                    }
                }
            }
        }
        Ok(Some(Value::String(out)))
    }

    fn lookup(&mut self, target: &str, optional: bool) -> Result<Option<Value>, ConfigError> {
        if self.in_progress.iter().any(|p| p == target) {
            return Err(ConfigError::CircularSubstitution(target.to_string()));
        }

        let root = self.root;
        if let Ok(value) = table_get(root, target) {
            self.in_progress.push(target.to_string());
            let resolved = self.resolve_value(value, target);
            self.in_progress.pop();
            return resolved;
        }
        if let Some(value) = self.lookup_through_reference(target)? {
            return Ok(Some(value));
        }

        match (self.env)(target) {
            Some(from_env) => {
                trace!(reference = target, "substitution resolved from environment");
                Ok(Some(Value::String(from_env)))
            }
            None if optional => {
                trace!(reference = target, "optional substitution left unset");
                Ok(None)
            }
            None => Err(ConfigError::UnresolvedSubstitution(target.to_string())),
        }
    }

    /// Find `target` when a value on its way is itself a reference, as in
    /// `${service.policy.retries}` with `policy = "${defaults}"`.
    fn lookup_through_reference(&mut self, target: &str) -> Result<Option<Value>, ConfigError> {
        let Ok(segments) = split_path(target) else {
            return Ok(None);
        };
        let mut current: &Table = self.root;
        for (i, segment) in segments.iter().enumerate() {
            match current.get(*segment) {
                Some(Value::Table(t)) => current = t,
                Some(Value::String(_)) if i + 1 < segments.len() => {
                    let prefix = segments[..=i].join(".");
                    let rest = segments[i + 1..].join(".");
                    self.in_progress.push(target.to_string());
                    let resolved = self.lookup(&prefix, false);
                    self.in_progress.pop();
                    return Ok(match resolved? {
                        Some(Value::Table(t)) => table_get(&t, &rest).ok().cloned(),
                        _ => None,
                    });
                }
                _ => return Ok(None),
            }
        }
        Ok(None)
    }
}

fn scalar_text(value: &Value, reference: &str) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Datetime(d) => Ok(d.to_string()),
        Value::Array(_) | Value::Table(_) => {
            Err(ConfigError::NonScalarSubstitution(reference.to_string()))
        }
    }
}
