//! Layered, typed configuration. Stack your sources, ask for a type, get a
//! value or nothing.
//!
//! typedconf merges configuration from ordered sources (inline text, files,
//! environment variables and programmatic values) into one immutable tree,
//! resolves `${...}` references across all of them, and answers typed
//! questions about it:
//!
//! ```
//! use std::time::Duration;
//! use typedconf::{Config, TypedConfig};
//!
//! let config = Config::builder()
//!     .set("server.port", 9000)
//!     .add_text("[server]\nhost = \"localhost\"\nport = 8080\ntimeout = \"30s\"\n")
//!     .build()
//!     .unwrap();
//!
//! let typed = TypedConfig::new(config);
//! assert_eq!(typed.get::<i32>("server.port"), Some(9000));
//! assert_eq!(typed.get::<Duration>("server.timeout"), Some(Duration::from_secs(30)));
//! assert_eq!(typed.get::<i32>("server.host"), None);
//! ```
//!
//! # The configuration tree
//!
//! A [`Config`] is an immutable `toml::Table` behind an `Arc`: cloning is
//! cheap and a `Config` can be shared freely across threads. Values are
//! addressed by dotted paths (`server.port`). A path with an empty segment
//! (`a..b`, `.a`) is malformed and never matches anything.
//!
//! The raw accessors (`get_string`, `get_i64`, `get_duration`, ...) return
//! `Result` and say exactly what went wrong. Scalars coerce the way config
//! authors expect:
//!
//! | Target | Accepts |
//! |--------|---------|
//! | `String` | any scalar, rendered as text |
//! | `i32` / `i64` | integers, whole floats, numeric strings |
//! | `bool` | booleans, `true/yes/on`, `false/no/off` |
//! | [`Duration`](std::time::Duration) | `"30s"`, `"1.5h"`, bare integers as milliseconds |
//! | [`ByteSize`] | `"512K"`, `"10MiB"`, `"1kB"`, bare integers as bytes |
//!
//! # Sources and precedence
//!
//! Sources are listed in **priority-descending** order: the first source
//! added wins, later ones fill the gaps. Sections merge key by key; a scalar
//! on the winning side replaces a section on the losing one.
//!
//! ```text
//! .set("port", 1)            ← highest priority
//! .add_env("MYAPP")          MYAPP__SERVER__PORT=2
//! .add_file("app.toml")
//! .add_text(DEFAULTS)        ← lowest priority
//! ```
//!
//! Every source implements [`ConfigProvider`]; so does any closure
//! returning `Result<Config, ConfigError>`, which is the extension point for
//! remote or computed sources. A provider that fails aborts the build. A
//! missing optional file is just an empty source.
//!
//! # Substitutions
//!
//! String values may reference other paths: `url = "http://${host}:${port}"`.
//! A value that is *only* a reference (`port = "${base.port}"`) keeps the
//! referenced value's type. References are resolved once, after merging, so
//! they may cross sources. A path missing from the tree falls back to the
//! environment variable of the same name. `${?path}` is optional and
//! expands to nothing when unresolved; `$$` is a literal `$`. Cycles are
//! reported as [`ConfigError::CircularSubstitution`].
//!
//! # Typed lookups and evaluators
//!
//! [`TypedConfig::get::<T>`](TypedConfig::get) returns `Option<T>`. Absence
//! covers a missing path, a malformed path, a failed conversion, and a
//! type nothing knows how to produce. [`TypedConfig::require`] turns
//! absence into an error naming the path.
//!
//! Types beyond the built-in set are taught through an
//! [`EvaluatorRegistry`]. An evaluator returns `Ok(Some(v))` to answer,
//! `Ok(None)` to pass, or `Err(_)` for a fault, which is logged and treated
//! as a pass. Each evaluator sits in a [`Tier`]:
//!
//! 1. [`Tier::PreBuiltin`]: runs before the built-ins and may shadow them
//! 2. built-in conversions
//! 3. [`Tier::PostBuiltin`] (default): runs when no built-in answered
//! 4. registered enums
//! 5. [`Tier::Fallback`]: last resort
//!
//! ```
//! use std::sync::Arc;
//! use typedconf::{Config, EvaluatorRegistry, TypedConfig};
//!
//! #[derive(Debug, PartialEq)]
//! struct Port(u16);
//!
//! let registry = Arc::new(EvaluatorRegistry::new());
//! registry.register_default::<Port, _>(|config, path| {
//!     Ok(u16::try_from(config.get_i64(path)?).ok().map(Port))
//! });
//!
//! let typed = TypedConfig::with_registry(Config::parse_str("port = 8080").unwrap(), registry);
//! assert_eq!(typed.get::<Port>("port"), Some(Port(8080)));
//! ```
//!
//! No evaluator ever runs for a path that doesn't exist.
//!
//! [`TypedConfig::lazy`] defers a lookup until first use and caches the
//! outcome, absence included.
//!
//! # Struct binding
//!
//! For a fixed schema, [`Config::bind`] deserializes the tree into a
//! [confique](https://docs.rs/confique) struct. `#[config(default)]` values
//! fill the gaps, missing required fields are reported, and keys the struct
//! doesn't declare are rejected with the full list. Use
//! [`Config::bind_lenient`] to ignore them instead.
//!
//! # Error handling
//!
//! Fallible operations return [`ConfigError`]. See the [`error`] module for
//! the full set.

pub mod error;
pub mod types;
pub mod units;

mod bind;
mod builder;
mod config;
mod convert;
mod env;
mod evaluator;
mod file;
mod format;
mod lazy;
pub(crate) mod merge;
mod overrides;
mod resolve;
mod source;
mod typed;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::ConfigBuilder;
pub use config::Config;
pub use env::EnvSource;
pub use error::ConfigError;
pub use evaluator::{EvalError, EvalResult, EvaluatorRegistry};
pub use file::FileSource;
pub use lazy::Lazy;
pub use source::{ConfigProvider, OverrideSource, TextSource, build};
pub use typed::{TypedConfig, is_builtin};
pub use types::{Format, Tier};
pub use units::{ByteSize, Number};
