//! Error types for job dispatch.

use thiserror::Error;

/// Result alias used throughout the dispatch layer.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors raised while configuring adapters or dispatching jobs.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A symbolic adapter name did not resolve to a registered adapter type.
    #[error("Adapter not found: '{name}' (looked up as {type_name})")]
    AdapterNotFound { name: String, type_name: String },

    /// The active adapter does not support the requested operation.
    #[error("{adapter} adapter does not support {operation}")]
    NotImplemented {
        adapter: String,
        operation: &'static str,
    },

    /// No performer is registered for the job class.
    #[error("Unknown job class: {0}")]
    UnknownJob(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Arguments could not be converted to or from their serialized form.
    #[error("Invalid arguments for {class}: {reason}")]
    InvalidArguments { class: String, reason: String },

    /// The adapter failed to accept the job.
    #[error("Adapter error: {0}")]
    Adapter(String),

    /// A job body reported failure.
    #[error("{class} failed: {message}")]
    Failed { class: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DispatchError {
    /// Create a job failure for the given class.
    pub fn failed(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            class: class.into(),
            message: message.into(),
        }
    }

    /// Create a "not implemented" error for an adapter operation.
    pub fn not_implemented(adapter: impl Into<String>, operation: &'static str) -> Self {
        Self::NotImplemented {
            adapter: adapter.into(),
            operation,
        }
    }

    /// Check whether this error signals missing adapter support.
    ///
    /// Test code uses this to skip scheduling scenarios on adapters
    /// that cannot honor a future timestamp.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, DispatchError::NotImplemented { .. })
    }
}
