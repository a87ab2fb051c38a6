#[cfg(test)]
pub mod test {
    use confique::Config;
    use serde::{Deserialize, Serialize};

    /// A document touching every built-in value shape.
    pub const SAMPLE: &str = r#"
debug = true
ratio = 0.75
mode = "fast"
modes = ["slow", "fast"]
tags = ["sdf", "23d2s", "3as4"]
ports = [80, 443]
flags = [true, false]
backoff = ["100ms", "1s"]
buffers = [1024, "2K"]
replicas = [{ host = "a" }, { host = "b" }]

[server]
host = "localhost"
port = 8080
timeout = "30s"
max_body = "512K"
"#;

    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    #[serde(rename_all = "lowercase")]
    pub enum Mode {
        Fast,
        Slow,
    }

    // -- Schemas for struct binding -------------------------------------------

    #[derive(Config, Debug)]
    pub struct AppSchema {
        /// Interface to listen on.
        #[config(default = "localhost")]
        pub host: String,

        #[config(default = 8080)]
        pub port: u16,

        #[config(default = false)]
        pub debug: bool,

        #[config(nested)]
        pub db: DbSchema,
    }

    #[derive(Config, Debug)]
    pub struct DbSchema {
        /// Unset means "use the embedded store".
        pub url: Option<String>,

        #[config(default = 5)]
        pub max_connections: u32,
    }

    #[derive(Config, Debug)]
    pub struct ModeSchema {
        #[config(default = "fast")]
        pub mode: Mode,

        /// Required: no default.
        pub workers: u32,
    }

    #[test]
    fn sample_parses() {
        let table: toml::Table = SAMPLE.parse().unwrap();
        assert!(table.contains_key("server"));
    }

    #[test]
    fn schema_defaults_load() {
        let app = AppSchema::builder().load().unwrap();
        assert_eq!((app.host.as_str(), app.port), ("localhost", 8080));
        assert_eq!(app.db.max_connections, 5);
        assert!(ModeSchema::builder().load().is_err());
    }
}
