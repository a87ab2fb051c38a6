//! Fallback-merge of configuration trees.

use toml::{Table, Value};

/// `primary` with its gaps filled from `fallback`.
///
/// Sections present on both sides merge recursively. Any other value on the
/// primary side wins outright, including a scalar shadowing a fallback
/// section. Arrays are never concatenated.
pub fn with_fallback(primary: &Table, fallback: &Table) -> Table {
    let mut merged = primary.clone();
    fill_gaps(&mut merged, fallback);
    merged
}

fn fill_gaps(target: &mut Table, fallback: &Table) {
    for (key, backup) in fallback {
        match (target.get_mut(key), backup) {
            (Some(Value::Table(section)), Value::Table(backup_section)) => {
                fill_gaps(section, backup_section);
            }
            (Some(_), _) => {}
            (None, _) => {
                target.insert(key.clone(), backup.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(toml_str: &str) -> Table {
        toml_str.parse::<Table>().unwrap()
    }

    #[test]
    fn disjoint_keys_merge() {
        let merged = with_fallback(&table(r#"host = "localhost""#), &table("port = 3000"));
        assert_eq!(merged["host"].as_str().unwrap(), "localhost");
        assert_eq!(merged["port"].as_integer().unwrap(), 3000);
    }

    #[test]
    fn primary_wins_on_conflict() {
        let merged = with_fallback(&table("port = 8080"), &table("port = 3000"));
        assert_eq!(merged["port"].as_integer().unwrap(), 8080);
    }

    #[test]
    fn nested_tables_recurse() {
        let primary = table(
            r#"
            [database]
            pool_size = 20
            "#,
        );
        let fallback = table(
            r#"
            [database]
            url = "postgres://old"
            pool_size = 5
            "#,
        );
        let merged = with_fallback(&primary, &fallback);
        let db = merged["database"].as_table().unwrap();
        assert_eq!(db["url"].as_str().unwrap(), "postgres://old");
        assert_eq!(db["pool_size"].as_integer().unwrap(), 20);
    }

    #[test]
    fn primary_scalar_hides_fallback_table() {
        let primary = table(r#"database = "flat_string""#);
        let fallback = table(
            r#"
            [database]
            url = "x"
            "#,
        );
        let merged = with_fallback(&primary, &fallback);
        assert_eq!(merged["database"].as_str().unwrap(), "flat_string");
    }

    #[test]
    fn fallback_scalar_leaves_primary_table() {
        let primary = table("[database]\nurl = \"x\"\n");
        let merged = with_fallback(&primary, &table("database = 1"));
        assert_eq!(merged["database"]["url"].as_str().unwrap(), "x");
    }

    #[test]
    fn empty_fallback_returns_primary() {
        let primary = table("port = 8080");
        assert_eq!(with_fallback(&primary, &Table::new()), primary);
    }

    #[test]
    fn empty_primary_returns_fallback() {
        let fallback = table("port = 3000");
        assert_eq!(with_fallback(&Table::new(), &fallback), fallback);
    }

    #[test]
    fn arrays_are_replaced_not_concatenated() {
        let merged = with_fallback(&table("hosts = [\"a\"]"), &table("hosts = [\"b\", \"c\"]"));
        assert_eq!(merged["hosts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn fallback_chain_is_associative() {
        let a = table(r#"host = "a""#);
        let b = table("port = 1000\nhost = \"b\"");
        let c = table("port = 2000\ndebug = true");
        let left = with_fallback(&with_fallback(&a, &b), &c);
        let right = with_fallback(&a, &with_fallback(&b, &c));
        assert_eq!(left, right);
        assert_eq!(left["host"].as_str().unwrap(), "a");
        assert_eq!(left["port"].as_integer().unwrap(), 1000);
        assert!(left["debug"].as_bool().unwrap());
    }
}
