//! # typedconf demo
//!
//! Layers a few sources, teaches the registry a custom type and prints what
//! typed lookups return. Exists to exercise the API by hand.
//!
//! ```sh
//! cargo run --example typedconf_demo
//! TYPEDCONF_DEMO__SERVER__PORT=9999 cargo run --example typedconf_demo
//! cargo run --example typedconf_demo -- path/to/override.toml
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use typedconf::{ByteSize, Config, ConfigError, EvaluatorRegistry, Tier};

const DEFAULTS: &str = r#"
name = "demo"
log_level = "info"

[server]
host = "127.0.0.1"
port = 8080
timeout = "30s"
max_body = "1MiB"
endpoint = "${server.host}:${server.port}"
"#;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

/// `host:port`, parsed by a registered evaluator.
#[derive(Debug)]
struct Endpoint {
    host: String,
    port: u16,
}

fn registry() -> Arc<EvaluatorRegistry> {
    let registry = Arc::new(EvaluatorRegistry::new());
    registry.register_enum::<LogLevel>();
    registry.register_default::<Endpoint, _>(|config, path| {
        let raw = config.get_string(path)?;
        let Some((host, port)) = raw.rsplit_once(':') else {
            return Ok(None);
        };
        Ok(Some(Endpoint {
            host: host.to_string(),
            port: port.parse()?,
        }))
    });
    // Accept "off" as a zero timeout when nothing else could read the value.
    registry.register::<Duration, _>(Tier::Fallback, |config, path| {
        Ok((config.get_string(path)? == "off").then_some(Duration::ZERO))
    });
    registry
}

fn main() -> Result<(), ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = std::env::args().nth(1) {
        builder = builder.add_file(path);
    }
    let config = builder
        .add_env("TYPEDCONF_DEMO")
        .add_platform_file("typedconf-demo", "typedconf-demo.toml")
        .add_text(DEFAULTS)
        .registry(registry())
        .build_typed()?;

    println!("{}", config.config());
    println!("name       = {:?}", config.get::<String>("name"));
    println!("log_level  = {:?}", config.get::<LogLevel>("log_level"));
    println!("port       = {:?}", config.get::<i32>("server.port"));
    println!("timeout    = {:?}", config.get::<Duration>("server.timeout"));
    println!("max_body   = {:?}", config.get::<ByteSize>("server.max_body"));

    let endpoint = config.lazy::<Endpoint>("server.endpoint");
    match endpoint.get() {
        Some(Endpoint { host, port }) => println!("endpoint   = {host} port {port}"),
        None => println!("endpoint   = <unparseable>"),
    }

    let port = config.require::<i64>("server.port")?;
    println!("required port: {port}");
    Ok(())
}
