//! Adapter contract and the adapter registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::adapters::{InlineAdapter, TestAdapter};
use crate::dispatcher::ExecutionContext;
use crate::error::{DispatchError, DispatchResult};
use crate::job::JobRecord;

/// Name reserved for the in-memory test adapter.
pub const TEST_ADAPTER: &str = "test";

/// Pluggable backend receiving job records.
///
/// Adapters that run jobs in the calling thread do so through
/// [`ExecutionContext::execute`], which keeps nested executions correctly
/// tagged.
pub trait QueueAdapter: Send + Sync {
    /// Short adapter name used in log lines (e.g. "Inline", "Test").
    fn name(&self) -> &str;

    /// Accept a record for execution as soon as possible.
    fn enqueue(&self, job: JobRecord, ctx: &mut ExecutionContext<'_>) -> DispatchResult<()>;

    /// Accept a record carrying a `scheduled_at` time.
    ///
    /// Adapters that cannot defer execution keep the default, which fails
    /// with [`DispatchError::NotImplemented`].
    fn enqueue_at(&self, job: JobRecord, ctx: &mut ExecutionContext<'_>) -> DispatchResult<()> {
        let _ = (job, ctx);
        Err(DispatchError::not_implemented(self.name(), "enqueue_at"))
    }
}

/// The ways an adapter can be selected.
#[derive(Clone)]
pub enum AdapterSpec {
    /// The reserved test adapter; always a fresh instance.
    Test,
    /// A symbolic name resolved through the registry's naming convention.
    Named(String),
    /// A concrete adapter, used as-is.
    Instance(Arc<dyn QueueAdapter>),
}

impl fmt::Debug for AdapterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterSpec::Test => write!(f, "Test"),
            AdapterSpec::Named(name) => f.debug_tuple("Named").field(name).finish(),
            AdapterSpec::Instance(adapter) => f.debug_tuple("Instance").field(&adapter.name()).finish(),
        }
    }
}

impl From<&str> for AdapterSpec {
    fn from(name: &str) -> Self {
        if name == TEST_ADAPTER {
            AdapterSpec::Test
        } else {
            AdapterSpec::Named(name.to_string())
        }
    }
}

impl From<String> for AdapterSpec {
    fn from(name: String) -> Self {
        AdapterSpec::from(name.as_str())
    }
}

impl From<Arc<dyn QueueAdapter>> for AdapterSpec {
    fn from(adapter: Arc<dyn QueueAdapter>) -> Self {
        AdapterSpec::Instance(adapter)
    }
}

impl<A: QueueAdapter + 'static> From<Arc<A>> for AdapterSpec {
    fn from(adapter: Arc<A>) -> Self {
        AdapterSpec::Instance(adapter)
    }
}

/// Constructor stored in the registry.
type AdapterFactory = Arc<dyn Fn() -> Arc<dyn QueueAdapter> + Send + Sync>;

/// Registry mapping adapter type names to constructors.
///
/// Names follow a fixed convention: `"inline"` is looked up as
/// `"InlineAdapter"`, `"delayed_job"` as `"DelayedJobAdapter"`.
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    factories: HashMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the adapters shipped in this crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("InlineAdapter", || Arc::new(InlineAdapter::new()));
        registry
    }

    /// Register a constructor under an adapter type name.
    pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn QueueAdapter> + Send + Sync + 'static,
    {
        self.factories.insert(type_name.into(), Arc::new(factory));
    }

    /// Register a shared adapter instance under an adapter type name.
    pub fn register_instance(&mut self, type_name: impl Into<String>, adapter: Arc<dyn QueueAdapter>) {
        self.register(type_name, move || Arc::clone(&adapter));
    }

    /// Check if an adapter type name is registered.
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// List all registered adapter type names.
    pub fn type_names(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    /// Resolve an adapter selection to a concrete adapter.
    pub fn resolve(&self, spec: impl Into<AdapterSpec>) -> DispatchResult<Arc<dyn QueueAdapter>> {
        match spec.into() {
            AdapterSpec::Test => Ok(Arc::new(TestAdapter::new())),
            AdapterSpec::Named(name) if name == TEST_ADAPTER => Ok(Arc::new(TestAdapter::new())),
            AdapterSpec::Instance(adapter) => Ok(adapter),
            AdapterSpec::Named(name) => {
                let type_name = adapter_type_name(&name);
                let factory = self
                    .factories
                    .get(&type_name)
                    .ok_or_else(|| DispatchError::AdapterNotFound {
                        name: name.clone(),
                        type_name: type_name.clone(),
                    })?;
                Ok(factory())
            }
        }
    }
}

/// Map a symbolic adapter name to its registered type name.
pub fn adapter_type_name(name: &str) -> String {
    let camel: String = name
        .split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    format!("{camel}Adapter")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_type_name() {
        assert_eq!(adapter_type_name("inline"), "InlineAdapter");
        assert_eq!(adapter_type_name("delayed_job"), "DelayedJobAdapter");
        assert_eq!(adapter_type_name("sucker-punch"), "SuckerPunchAdapter");
    }

    #[test]
    fn test_resolve_named_and_reserved() {
        let registry = AdapterRegistry::with_defaults();

        let inline = registry.resolve("inline").unwrap();
        assert_eq!(inline.name(), "Inline");

        let test = registry.resolve(TEST_ADAPTER).unwrap();
        assert_eq!(test.name(), "Test");
    }

    #[test]
    fn test_resolve_unknown_name() {
        let registry = AdapterRegistry::with_defaults();
        let err = registry.resolve("sidekiq").err().unwrap();
        match err {
            DispatchError::AdapterNotFound { name, type_name } => {
                assert_eq!(name, "sidekiq");
                assert_eq!(type_name, "SidekiqAdapter");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reserved_name_yields_fresh_instances() {
        let registry = AdapterRegistry::new();
        let a = registry.resolve(AdapterSpec::Test).unwrap();
        let b = registry.resolve(AdapterSpec::Test).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        let named = registry
            .resolve(AdapterSpec::Named(TEST_ADAPTER.to_string()))
            .unwrap();
        assert_eq!(named.name(), "Test");
        assert!(!Arc::ptr_eq(&a, &named));
    }

    #[test]
    fn test_instances_are_used_as_is() {
        let mut registry = AdapterRegistry::new();
        let shared: Arc<dyn QueueAdapter> = Arc::new(TestAdapter::new());
        registry.register_instance("SharedAdapter", shared.clone());

        assert!(registry.is_registered("SharedAdapter"));
        assert!(Arc::ptr_eq(&registry.resolve("shared").unwrap(), &shared));
        assert!(Arc::ptr_eq(&registry.resolve(shared.clone()).unwrap(), &shared));
    }
}
