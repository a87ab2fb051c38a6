//! Custom evaluators and the registry that holds them.
//!
//! An evaluator turns the value at a path into some type `T` the engine knows
//! nothing about (a UUID, a URL, a domain type). It returns:
//!
//! - `Ok(Some(value))`: resolution stops with `value`;
//! - `Ok(None)`: "not mine", the next evaluator is tried;
//! - `Err(_)`: a fault, logged and treated exactly like `Ok(None)`.
//!
//! Evaluators are bucketed by `(T, Tier)` and tried in registration order
//! within a bucket. Buckets only grow.
//!
//! The registry also records which types are enums, since enum extraction
//! sits at a fixed step of the dispatch rather than in a tier.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::ConfigError;
use crate::types::Tier;

/// Error type evaluators may fail with. Anything convertible via `?` works.
pub type EvalError = Box<dyn std::error::Error + Send + Sync>;

/// What an evaluator returns.
pub type EvalResult<T> = Result<Option<T>, EvalError>;

type EvalFn<T> = dyn Fn(&Config, &str) -> EvalResult<T> + Send + Sync;

/// A type-erased evaluator; always a `TypedEvaluator<T>` for the bucket's `T`.
type ErasedEvaluator = Arc<dyn Any + Send + Sync>;

/// A type-erased `fn(&Config, &str) -> Result<T, ConfigError>` for enum extraction.
type ErasedExtractor = Arc<dyn Any + Send + Sync>;

pub(crate) type Extractor<T> = fn(&Config, &str) -> Result<T, ConfigError>;

pub(crate) struct TypedEvaluator<T> {
    func: Box<EvalFn<T>>,
}

impl<T> TypedEvaluator<T> {
    pub(crate) fn call(&self, config: &Config, path: &str) -> EvalResult<T> {
        (self.func)(config, path)
    }
}

static GLOBAL: LazyLock<Arc<EvaluatorRegistry>> =
    LazyLock::new(|| Arc::new(EvaluatorRegistry::new()));

#[derive(Default)]
pub struct EvaluatorRegistry {
    evaluators: RwLock<HashMap<(TypeId, Tier), Vec<ErasedEvaluator>>>,
    enums: RwLock<HashMap<TypeId, ErasedExtractor>>,
    enum_lists: RwLock<HashMap<TypeId, ErasedExtractor>>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, used when no explicit one is supplied.
    pub fn global() -> Arc<EvaluatorRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Append `evaluator` to the `(T, tier)` bucket.
    pub fn register<T, F>(&self, tier: Tier, evaluator: F)
    where
        T: 'static,
        F: Fn(&Config, &str) -> EvalResult<T> + Send + Sync + 'static,
    {
        let erased: ErasedEvaluator = Arc::new(TypedEvaluator {
            func: Box::new(evaluator),
        });
        self.evaluators
            .write()
            .entry((TypeId::of::<T>(), tier))
            .or_default()
            .push(erased);
    }

    /// Register in the default tier ([`Tier::PostBuiltin`]).
    pub fn register_default<T, F>(&self, evaluator: F)
    where
        T: 'static,
        F: Fn(&Config, &str) -> EvalResult<T> + Send + Sync + 'static,
    {
        self.register(Tier::default(), evaluator);
    }

    /// Declare `E` an enum: `get::<E>` and `get::<Vec<E>>` then match stored
    /// strings against its variants through serde.
    pub fn register_enum<E>(&self)
    where
        E: DeserializeOwned + 'static,
    {
        let single: Extractor<E> = Config::get_enum::<E>;
        let list: Extractor<Vec<E>> = Config::get_enum_list::<E>;
        self.enums
            .write()
            .insert(TypeId::of::<E>(), Arc::new(single));
        self.enum_lists
            .write()
            .insert(TypeId::of::<Vec<E>>(), Arc::new(list));
    }

    /// Number of evaluators registered for `(T, tier)`.
    pub fn count<T: 'static>(&self, tier: Tier) -> usize {
        self.evaluators
            .read()
            .get(&(TypeId::of::<T>(), tier))
            .map_or(0, Vec::len)
    }

    /// A snapshot of the `(T, tier)` bucket. The lock is released before any
    /// evaluator runs, so evaluators may themselves register or resolve.
    pub(crate) fn snapshot<T: 'static>(&self, tier: Tier) -> Vec<ErasedEvaluator> {
        self.evaluators
            .read()
            .get(&(TypeId::of::<T>(), tier))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn enum_extractor<T: 'static>(&self) -> Option<Extractor<T>> {
        let erased = self.enums.read().get(&TypeId::of::<T>()).cloned()?;
        erased.downcast_ref::<Extractor<T>>().copied()
    }

    pub(crate) fn enum_list_extractor<T: 'static>(&self) -> Option<Extractor<T>> {
        let erased = self.enum_lists.read().get(&TypeId::of::<T>()).cloned()?;
        erased.downcast_ref::<Extractor<T>>().copied()
    }
}

impl fmt::Debug for EvaluatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let evaluators: usize = self.evaluators.read().values().map(Vec::len).sum();
        f.debug_struct("EvaluatorRegistry")
            .field("evaluators", &evaluators)
            .field("enums", &self.enums.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::Mode;

    #[derive(Debug, PartialEq)]
    struct Port(u16);

    #[test]
    fn buckets_are_per_type_and_tier() {
        let registry = EvaluatorRegistry::new();
        registry.register::<Port, _>(Tier::PreBuiltin, |_, _| Ok(None));
        registry.register::<Port, _>(Tier::PreBuiltin, |_, _| Ok(None));
        registry.register_default::<Port, _>(|_, _| Ok(None));
        registry.register::<String, _>(Tier::Fallback, |_, _| Ok(None));

        assert_eq!(registry.count::<Port>(Tier::PreBuiltin), 2);
        assert_eq!(registry.count::<Port>(Tier::PostBuiltin), 1);
        assert_eq!(registry.count::<Port>(Tier::Fallback), 0);
        assert_eq!(registry.count::<String>(Tier::Fallback), 1);
    }

    #[test]
    fn snapshot_preserves_registration_order() {
        let registry = EvaluatorRegistry::new();
        for n in 0..3u16 {
            registry.register_default::<Port, _>(move |_, _| Ok(Some(Port(n))));
        }
        let config = Config::empty();
        let order: Vec<u16> = registry
            .snapshot::<Port>(Tier::PostBuiltin)
            .iter()
            .filter_map(|e| e.downcast_ref::<TypedEvaluator<Port>>())
            .map(|e| e.call(&config, "x").unwrap().unwrap().0)
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn enum_registration() {
        let registry = EvaluatorRegistry::new();
        assert!(registry.enum_extractor::<Mode>().is_none());
        registry.register_enum::<Mode>();
        assert!(registry.enum_extractor::<Mode>().is_some());
        assert!(registry.enum_list_extractor::<Vec<Mode>>().is_some());
        assert!(registry.enum_list_extractor::<Mode>().is_none());
    }

    #[test]
    fn concurrent_registration_loses_nothing() {
        let registry = Arc::new(EvaluatorRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        registry.register_default::<Port, _>(|_, _| Ok(None));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.count::<Port>(Tier::PostBuiltin), 400);
    }

    #[test]
    fn global_is_shared() {
        assert!(Arc::ptr_eq(
            &EvaluatorRegistry::global(),
            &EvaluatorRegistry::global()
        ));
    }
}
