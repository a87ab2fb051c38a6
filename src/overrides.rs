//! Dotted-path writes into a `toml::Table`.
//!
//! `("database.url", "pg://")` lands as `{database = {url = "pg://"}}`.
//! Programmatic overrides and the properties reader both build their trees
//! this way.

use toml::{Table, Value};

/// Expand `(path, value)` pairs into a nested table. Later pairs overwrite
/// earlier ones at the same path.
pub fn expand<'a>(entries: impl IntoIterator<Item = &'a (String, Value)>) -> Table {
    entries
        .into_iter()
        .fold(Table::new(), |mut table, (path, value)| {
            insert_dotted(&mut table, path, value.clone());
            table
        })
}

/// Write `value` at `dotted_key`, creating sections on the way down.
///
/// A scalar in the way of a section is replaced. Blank segments are skipped,
/// so `"a..b"` writes `a.b` and `".."` writes nothing.
pub fn insert_dotted(table: &mut Table, dotted_key: &str, value: Value) {
    let mut segments = dotted_key
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .peekable();

    let mut current = table;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let slot = current
            .entry(segment)
            .or_insert_with(|| Value::Table(Table::new()));
        if !slot.is_table() {
            *slot = Value::Table(Table::new());
        }
        current = match slot {
            Value::Table(next) => next,
            _ => return,
        };
    }
}
