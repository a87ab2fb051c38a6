//! Type-directed lookup: `get::<T>(path)` and friends.
//!
//! Dispatch for a requested type `T`, stopping at the first value produced:
//!
//! ```text
//! path absent?                 → None, nothing else runs
//! Tier::PreBuiltin evaluators  (registration order)
//! built-in extraction          (closed table, see below)
//! Tier::PostBuiltin evaluators
//! enum extraction              (types declared with register_enum)
//! list-of-enum extraction
//! Tier::Fallback evaluators
//! → None
//! ```
//!
//! Built-in types: `String`, `i32`, `i64`, `f64`, `bool`, `Duration`,
//! [`ByteSize`], [`Number`], [`Config`], `toml::Value`, `Vec<toml::Value>`,
//! and `Vec<_>` of each scalar as well as `Vec<Config>`. A built-in
//! conversion failure is absence, not a stop: later tiers still get a turn.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use toml::Value;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::ConfigError;
use crate::evaluator::{EvaluatorRegistry, TypedEvaluator};
use crate::lazy::Lazy;
use crate::types::Tier;
use crate::units::{ByteSize, Number};

type BuiltinExtractor = fn(&Config, &str) -> Result<Box<dyn Any>, ConfigError>;

macro_rules! builtins {
    ($($ty:ty => $method:ident),* $(,)?) => {{
        let mut table: HashMap<TypeId, BuiltinExtractor> = HashMap::new();
        $(
            let extract: BuiltinExtractor =
                |config, path| config.$method(path).map(|v| Box::new(v) as Box<dyn Any>);
            table.insert(TypeId::of::<$ty>(), extract);
        )*
        table
    }};
}

static BUILTINS: LazyLock<HashMap<TypeId, BuiltinExtractor>> = LazyLock::new(|| {
    builtins! {
        String => get_string,
        i32 => get_i32,
        i64 => get_i64,
        f64 => get_f64,
        bool => get_bool,
        Duration => get_duration,
        ByteSize => get_byte_size,
        Number => get_number,
        Config => get_config,
        Value => get_value,
        Vec<Value> => get_list,
        Vec<String> => get_string_list,
        Vec<i32> => get_i32_list,
        Vec<i64> => get_i64_list,
        Vec<f64> => get_f64_list,
        Vec<bool> => get_bool_list,
        Vec<Duration> => get_duration_list,
        Vec<ByteSize> => get_byte_size_list,
        Vec<Number> => get_number_list,
        Vec<Config> => get_config_list,
    }
});

/// Whether `T` has a built-in extraction.
pub fn is_builtin<T: 'static>() -> bool {
    BUILTINS.contains_key(&TypeId::of::<T>())
}

fn builtin<T: 'static>(config: &Config, path: &str) -> Option<T> {
    let extract = BUILTINS.get(&TypeId::of::<T>())?;
    match extract(config, path) {
        Ok(boxed) => boxed.downcast::<T>().ok().map(|v| *v),
        Err(e) => {
            trace!(path, error = %e, "built-in extraction failed");
            None
        }
    }
}

fn run_tier<T: 'static>(
    registry: &EvaluatorRegistry,
    tier: Tier,
    config: &Config,
    path: &str,
) -> Option<T> {
    for erased in registry.snapshot::<T>(tier) {
        let Some(evaluator) = erased.downcast_ref::<TypedEvaluator<T>>() else {
            continue;
        };
        match evaluator.call(config, path) {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(e) => debug!(
                path,
                ?tier,
                target_type = std::any::type_name::<T>(),
                error = %e,
                "evaluator failed, trying next"
            ),
        }
    }
    None
}

/// Look up `path` as a `T`. Never fails: missing, unconvertible and faulting
/// lookups are all `None`.
pub fn get<T: 'static>(registry: &EvaluatorRegistry, config: &Config, path: &str) -> Option<T> {
    if !config.has_path(path) {
        trace!(path, "no value at path");
        return None;
    }

    run_tier(registry, Tier::PreBuiltin, config, path)
        .or_else(|| builtin(config, path))
        .or_else(|| run_tier(registry, Tier::PostBuiltin, config, path))
        .or_else(|| {
            registry
                .enum_extractor::<T>()
                .and_then(|extract| extract(config, path).ok())
        })
        .or_else(|| {
            registry
                .enum_list_extractor::<T>()
                .and_then(|extract| extract(config, path).ok())
        })
        .or_else(|| run_tier(registry, Tier::Fallback, config, path))
}

/// Like [`get`], but absence is a [`ConfigError::MissingOrUnconvertible`]
/// naming the path.
pub fn require<T: 'static>(
    registry: &EvaluatorRegistry,
    config: &Config,
    path: &str,
) -> Result<T, ConfigError> {
    get(registry, config, path).ok_or_else(|| ConfigError::MissingOrUnconvertible {
        path: path.to_string(),
    })
}

/// A resolved [`Config`] paired with the evaluator registry used for lookups.
///
/// Cheap to clone; both halves are shared.
#[derive(Clone)]
pub struct TypedConfig {
    config: Config,
    registry: Arc<EvaluatorRegistry>,
}

impl TypedConfig {
    /// Use the process-wide registry ([`EvaluatorRegistry::global`]).
    pub fn new(config: Config) -> Self {
        Self::with_registry(config, EvaluatorRegistry::global())
    }

    pub fn with_registry(config: Config, registry: Arc<EvaluatorRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<EvaluatorRegistry> {
        &self.registry
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.config.has_path(path)
    }

    pub fn get<T: 'static>(&self, path: &str) -> Option<T> {
        get(&self.registry, &self.config, path)
    }

    pub fn require<T: 'static>(&self, path: &str) -> Result<T, ConfigError> {
        require(&self.registry, &self.config, path)
    }

    /// A binding evaluated on first access and cached afterwards.
    pub fn lazy<T: 'static>(&self, path: &str) -> Lazy<T> {
        Lazy::new(self.clone(), path)
    }

    /// The subtree at `path`, sharing this registry.
    pub fn at(&self, path: &str) -> Option<TypedConfig> {
        let config = self.config.get_config(path).ok()?;
        Some(Self::with_registry(config, Arc::clone(&self.registry)))
    }
}

impl fmt::Debug for TypedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedConfig")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}

impl From<Config> for TypedConfig {
    fn from(config: Config) -> Self {
        TypedConfig::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Mode, SAMPLE};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn typed(toml_str: &str) -> TypedConfig {
        TypedConfig::with_registry(
            Config::parse_str(toml_str).unwrap(),
            Arc::new(EvaluatorRegistry::new()),
        )
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_scenario() {
        let config = TypedConfig::with_registry(
            Config::parse_json(r#"{"a":1,"b":"hello","c":{"d":2}}"#).unwrap(),
            Arc::new(EvaluatorRegistry::new()),
        );
        assert_eq!(config.get::<i32>("a"), Some(1));
        assert_eq!(config.get::<String>("b"), Some("hello".to_string()));
        assert_eq!(config.get::<i32>("c.d"), Some(2));
        assert_eq!(config.get::<i32>("c.e"), None);
    }

    #[test]
    fn list_scenario() {
        let config = typed(r#"a = ["sdf", "23d2s", "3as4"]"#);
        assert_eq!(config.get::<Vec<i32>>("a"), None);
        assert_eq!(
            config.get::<Vec<String>>("a"),
            Some(vec!["sdf".to_string(), "23d2s".into(), "3as4".into()])
        );
    }

    #[test]
    fn every_builtin_type() {
        let config = typed(SAMPLE);
        assert_eq!(config.get::<String>("server.host").as_deref(), Some("localhost"));
        assert_eq!(config.get::<i64>("server.port"), Some(8080));
        assert_eq!(config.get::<f64>("ratio"), Some(0.75));
        assert_eq!(config.get::<bool>("debug"), Some(true));
        assert_eq!(config.get::<Duration>("server.timeout"), Some(Duration::from_secs(30)));
        assert_eq!(config.get::<ByteSize>("server.max_body"), Some(ByteSize(512 * 1024)));
        assert_eq!(config.get::<Number>("server.port"), Some(Number::Integer(8080)));
        assert!(config.get::<Config>("server").is_some());
        assert_eq!(config.get::<Value>("debug"), Some(Value::Boolean(true)));
        assert_eq!(config.get::<Vec<Value>>("ports").map(|v| v.len()), Some(2));
        assert_eq!(config.get::<Vec<i64>>("ports"), Some(vec![80, 443]));
        assert_eq!(config.get::<Vec<i32>>("ports"), Some(vec![80, 443]));
        assert_eq!(config.get::<Vec<f64>>("ports"), Some(vec![80.0, 443.0]));
        assert_eq!(config.get::<Vec<bool>>("flags"), Some(vec![true, false]));
        assert_eq!(
            config.get::<Vec<Duration>>("backoff"),
            Some(vec![Duration::from_millis(100), Duration::from_secs(1)])
        );
        assert_eq!(config.get::<Vec<ByteSize>>("buffers"), Some(vec![ByteSize(1024), ByteSize(2048)]));
        assert_eq!(config.get::<Vec<Number>>("ports").map(|v| v.len()), Some(2));
        assert_eq!(config.get::<Vec<Config>>("replicas").map(|v| v.len()), Some(2));
    }

    #[test]
    fn wrong_type_is_absent() {
        let config = typed(SAMPLE);
        assert_eq!(config.get::<i32>("server.host"), None);
        assert_eq!(config.get::<Config>("debug"), None);
        assert_eq!(config.get::<Duration>("server.host"), None);
    }

    #[test]
    fn out_of_range_float_is_not_an_integer() {
        let config = typed("big = 1e30\nneg = -1e30\nwhole = 42.0\n");
        assert_eq!(config.get::<i64>("big"), None);
        assert_eq!(config.get::<i64>("neg"), None);
        assert_eq!(config.get::<i32>("big"), None);
        assert_eq!(config.get::<i64>("whole"), Some(42));
        assert!(matches!(
            config.config().get_i64("big"),
            Err(ConfigError::BadValue { .. })
        ));
    }

    #[test]
    fn unknown_type_is_absent() {
        struct Unregistered;
        let config = typed(SAMPLE);
        assert!(config.get::<Unregistered>("server.host").is_none());
    }

    #[test]
    fn absent_path_never_invokes_evaluators() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(EvaluatorRegistry::new());
        for tier in [Tier::PreBuiltin, Tier::PostBuiltin, Tier::Fallback] {
            let counter = Arc::clone(&calls);
            registry.register::<String, _>(tier, move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Some("from evaluator".into()))
            });
        }
        let config = TypedConfig::with_registry(Config::parse_str(SAMPLE).unwrap(), registry);

        for path in ["missing", "server.missing", "debug.deeper", "bad..path"] {
            assert_eq!(config.get::<String>(path), None);
            assert_eq!(config.get::<i32>(path), None);
            assert!(config.get::<Config>(path).is_none());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn pre_builtin_evaluator_shadows_builtin() {
        let registry = Arc::new(EvaluatorRegistry::new());
        registry.register::<String, _>(Tier::PreBuiltin, |config, path| {
            Ok(Some(config.get_string(path)?.to_uppercase()))
        });
        let config = TypedConfig::with_registry(Config::parse_str(SAMPLE).unwrap(), registry);
        assert_eq!(config.get::<String>("server.host").as_deref(), Some("LOCALHOST"));
    }

    #[test]
    fn post_builtin_evaluator_does_not_shadow_builtin() {
        let registry = Arc::new(EvaluatorRegistry::new());
        registry.register_default::<String, _>(|_, _| Ok(Some("post".into())));
        let config = TypedConfig::with_registry(Config::parse_str(SAMPLE).unwrap(), registry);
        assert_eq!(config.get::<String>("server.host").as_deref(), Some("localhost"));
    }

    #[test]
    fn post_builtin_evaluator_rescues_failed_builtin() {
        let registry = Arc::new(EvaluatorRegistry::new());
        registry.register_default::<i64, _>(|config, path| {
            let raw = config.get_string(path)?;
            Ok(raw.replace(',', "").parse().ok())
        });
        let config =
            TypedConfig::with_registry(Config::parse_str("count = \"1,000\"").unwrap(), registry);
        assert_eq!(config.get::<i64>("count"), Some(1000));
    }

    #[test]
    fn later_evaluator_used_when_earlier_is_absent() {
        let registry = Arc::new(EvaluatorRegistry::new());
        registry.register_default::<u16, _>(|_, _| Ok(None));
        registry.register_default::<u16, _>(|config, path| Ok(Some(config.get_i64(path)? as u16)));
        let config = TypedConfig::with_registry(Config::parse_str("port = 81").unwrap(), registry);
        assert_eq!(config.get::<u16>("port"), Some(81));
    }

    #[test]
    fn faulting_evaluator_is_swallowed() {
        let registry = Arc::new(EvaluatorRegistry::new());
        registry.register::<u16, _>(Tier::PreBuiltin, |_, _| Err("strict parse failed".into()));
        registry.register::<u16, _>(Tier::Fallback, |_, _| Ok(Some(7)));
        let config = TypedConfig::with_registry(Config::parse_str("port = 81").unwrap(), registry);
        assert_eq!(config.get::<u16>("port"), Some(7));
    }

    #[test]
    fn faulting_pre_builtin_evaluator_leaves_builtin_in_charge() {
        let registry = Arc::new(EvaluatorRegistry::new());
        registry.register::<String, _>(Tier::PreBuiltin, |_, _| Err("lookup service down".into()));
        let config = TypedConfig::with_registry(Config::parse_str(SAMPLE).unwrap(), registry);
        assert_eq!(config.get::<String>("server.host").as_deref(), Some("localhost"));
    }

    #[test]
    fn tiers_run_in_fixed_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let registry = Arc::new(EvaluatorRegistry::new());
        for tier in [Tier::Fallback, Tier::PostBuiltin, Tier::PreBuiltin] {
            let order = Arc::clone(&order);
            registry.register::<u16, _>(tier, move |_, _| {
                order.lock().push(tier);
                Ok(None)
            });
        }
        let config = TypedConfig::with_registry(Config::parse_str("port = 81").unwrap(), registry);
        assert_eq!(config.get::<u16>("port"), None);
        assert_eq!(
            *order.lock(),
            vec![Tier::PreBuiltin, Tier::PostBuiltin, Tier::Fallback]
        );
    }

    #[test]
    fn enums_need_declaration() {
        let registry = Arc::new(EvaluatorRegistry::new());
        let config = TypedConfig::with_registry(Config::parse_str(SAMPLE).unwrap(), Arc::clone(&registry));
        assert_eq!(config.get::<Mode>("mode"), None);

        registry.register_enum::<Mode>();
        assert_eq!(config.get::<Mode>("mode"), Some(Mode::Fast));
        assert_eq!(config.get::<Vec<Mode>>("modes"), Some(vec![Mode::Slow, Mode::Fast]));
        assert_eq!(config.get::<Mode>("server.host"), None);
    }

    #[test]
    fn enum_runs_before_fallback_tier() {
        let registry = Arc::new(EvaluatorRegistry::new());
        registry.register_enum::<Mode>();
        registry.register::<Mode, _>(Tier::Fallback, |_, _| Ok(Some(Mode::Slow)));
        let config = TypedConfig::with_registry(Config::parse_str(SAMPLE).unwrap(), registry);
        assert_eq!(config.get::<Mode>("mode"), Some(Mode::Fast));
        assert_eq!(config.get::<Mode>("server.host"), Some(Mode::Slow));
    }

    #[test]
    fn uuid_evaluator() {
        let registry = Arc::new(EvaluatorRegistry::new());
        registry.register_default::<uuid::Uuid, _>(|config, path| {
            Ok(Some(uuid::Uuid::parse_str(&config.get_string(path)?)?))
        });
        let config = TypedConfig::with_registry(
            Config::parse_str(r#"uuid = "a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11""#).unwrap(),
            registry,
        );
        assert_eq!(
            config.get::<uuid::Uuid>("uuid"),
            Some(uuid::Uuid::parse_str("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11").unwrap())
        );
    }

    #[test]
    fn require_names_the_path() {
        let config = typed(SAMPLE);
        let err = config.require::<i32>("server.nowhere").unwrap_err();
        assert!(matches!(err, ConfigError::MissingOrUnconvertible { .. }));
        assert!(err.to_string().contains("server.nowhere"));

        assert_eq!(config.require::<i32>("server.port").unwrap(), 8080);
    }

    #[test]
    fn at_shares_registry() {
        let registry = Arc::new(EvaluatorRegistry::new());
        registry.register_default::<u16, _>(|config, path| Ok(Some(config.get_i64(path)? as u16)));
        let config = TypedConfig::with_registry(Config::parse_str(SAMPLE).unwrap(), registry);
        let server = config.at("server").unwrap();
        assert_eq!(server.get::<u16>("port"), Some(8080));
        assert!(config.at("debug").is_none());
    }

    #[test]
    fn builtin_table_is_closed() {
        assert!(is_builtin::<String>());
        assert!(is_builtin::<Vec<Config>>());
        assert!(!is_builtin::<u16>());
        assert!(!is_builtin::<Mode>());
    }
}
