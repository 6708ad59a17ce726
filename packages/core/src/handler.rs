//! Job registry mapping job classes to performers.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::dispatcher::ExecutionContext;
use crate::error::DispatchResult;
use crate::job::{Job, deserialize_arguments};

/// Type-erased job body, taking the record's serialized arguments.
pub type Performer =
    Arc<dyn Fn(&mut ExecutionContext<'_>, &[Value]) -> DispatchResult<()> + Send + Sync>;

/// Registry for job performers.
///
/// Maps job classes to the code that runs them, so records can be executed
/// without knowing their concrete job types.
#[derive(Default, Clone)]
pub struct JobRegistry {
    performers: HashMap<String, Performer>,
}

impl JobRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            performers: HashMap::new(),
        }
    }

    /// Register a typed job under its `NAME`.
    pub fn register<J: Job>(&mut self) -> &mut Self {
        self.register_fn(J::NAME, |ctx, args| {
            let args = deserialize_arguments::<J::Arguments>(J::NAME, args)?;
            J::perform(ctx, args)
        })
    }

    /// Register a closure working on raw argument values.
    pub fn register_fn<F>(&mut self, job_class: impl Into<String>, performer: F) -> &mut Self
    where
        F: Fn(&mut ExecutionContext<'_>, &[Value]) -> DispatchResult<()> + Send + Sync + 'static,
    {
        self.performers.insert(job_class.into(), Arc::new(performer));
        self
    }

    /// Get the performer for a job class.
    pub fn get(&self, job_class: &str) -> Option<Performer> {
        self.performers.get(job_class).cloned()
    }

    /// Check if a performer exists for a job class.
    pub fn is_registered(&self, job_class: &str) -> bool {
        self.performers.contains_key(job_class)
    }

    /// List all registered job classes.
    pub fn job_classes(&self) -> Vec<&str> {
        self.performers.keys().map(|s| s.as_str()).collect()
    }
}
