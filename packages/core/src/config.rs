//! Dispatcher configuration.

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, DispatchResult};

/// Environment variable selecting the active adapter.
pub const ENV_ADAPTER: &str = "JOB_DISPATCH_ADAPTER";
/// Environment variable overriding the default queue name.
pub const ENV_DEFAULT_QUEUE: &str = "JOB_DISPATCH_QUEUE";
/// Environment variable setting the queue name prefix.
pub const ENV_QUEUE_PREFIX: &str = "JOB_DISPATCH_QUEUE_PREFIX";
/// Environment variable toggling argument logging.
pub const ENV_LOG_ARGUMENTS: &str = "JOB_DISPATCH_LOG_ARGUMENTS";

/// Configuration for the dispatcher composition root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Name of the adapter to activate (e.g. "inline", "test").
    pub adapter: String,
    /// Queue used when a job declares none.
    pub default_queue: String,
    /// Optional prefix applied to every queue name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_name_prefix: Option<String>,
    /// Separator between prefix and queue name.
    pub queue_name_delimiter: String,
    /// Whether job arguments appear in log lines.
    pub log_arguments: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            adapter: "inline".to_string(),
            default_queue: "default".to_string(),
            queue_name_prefix: None,
            queue_name_delimiter: "_".to_string(),
            log_arguments: true,
        }
    }
}

impl DispatcherConfig {
    /// Config for tests: the in-memory test adapter.
    pub fn test() -> Self {
        Self::default().with_adapter("test")
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> DispatchResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> DispatchResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(adapter) = lookup(ENV_ADAPTER) {
            config.adapter = adapter;
        }
        if let Some(queue) = lookup(ENV_DEFAULT_QUEUE) {
            config.default_queue = queue;
        }
        config.queue_name_prefix = lookup(ENV_QUEUE_PREFIX).filter(|p| !p.is_empty());
        if let Some(flag) = lookup(ENV_LOG_ARGUMENTS) {
            config.log_arguments = parse_flag(&flag).ok_or_else(|| {
                DispatchError::InvalidConfig(format!("{ENV_LOG_ARGUMENTS}={flag} is not a boolean"))
            })?;
        }

        Ok(config)
    }

    /// Set the adapter name.
    pub fn with_adapter(mut self, adapter: impl Into<String>) -> Self {
        self.adapter = adapter.into();
        self
    }

    /// Set the default queue.
    pub fn with_default_queue(mut self, queue: impl Into<String>) -> Self {
        self.default_queue = queue.into();
        self
    }

    /// Set the queue name prefix.
    pub fn with_queue_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.queue_name_prefix = Some(prefix.into());
        self
    }

    /// Enable or disable argument logging.
    pub fn with_log_arguments(mut self, log_arguments: bool) -> Self {
        self.log_arguments = log_arguments;
        self
    }

    /// Resolve the full queue name for a job.
    ///
    /// Falls back to the default queue and applies the configured prefix.
    pub fn queue_name(&self, queue: Option<&str>) -> String {
        let base = queue.unwrap_or(&self.default_queue);
        match &self.queue_name_prefix {
            Some(prefix) => format!("{}{}{}", prefix, self.queue_name_delimiter, base),
            None => base.to_string(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
