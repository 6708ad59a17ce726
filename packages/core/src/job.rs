//! Job domain types: records, identifiers and the job trait.

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

use crate::dispatcher::ExecutionContext;
use crate::error::{DispatchError, DispatchResult};

/// Unique identifier for one enqueue request.
///
/// Generated identifiers are ULIDs, so they sort chronologically. An explicit
/// identifier can be supplied through [`EnqueueOptions::with_job_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Create a new unique job ID.
    pub fn new() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the identifier the way it appears in log tags:
    /// upper-cased, with underscores turned into dashes.
    pub fn tag(&self) -> String {
        self.0.to_uppercase().replace('_', "-")
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable snapshot of a single job invocation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    job_class: String,
    args: Vec<Value>,
    queue: String,
    job_id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scheduled_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Create a record for immediate execution with a fresh job ID.
    pub fn new(job_class: impl Into<String>, args: Vec<Value>, queue: impl Into<String>) -> Self {
        Self {
            job_class: job_class.into(),
            args,
            queue: queue.into(),
            job_id: JobId::new(),
            scheduled_at: None,
        }
    }

    /// Replace the generated job ID.
    pub fn with_job_id(mut self, job_id: impl Into<JobId>) -> Self {
        self.job_id = job_id.into();
        self
    }

    /// Schedule the record for a specific time.
    pub fn with_scheduled_at(mut self, scheduled_at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(scheduled_at);
        self
    }

    pub fn job_class(&self) -> &str {
        &self.job_class
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.scheduled_at
    }

    /// Check if the record carries a scheduled execution time.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled_at.is_some()
    }
}

/// A named unit of deferred work.
///
/// `NAME` is the job class recorded on every [`JobRecord`] and the key the
/// [`JobRegistry`](crate::JobRegistry) routes on.
///
/// ```ignore
/// struct HelloJob;
///
/// impl Job for HelloJob {
///     const NAME: &'static str = "HelloJob";
///     type Arguments = (String,);
///
///     fn perform(ctx: &mut ExecutionContext<'_>, (name,): Self::Arguments) -> DispatchResult<()> {
///         ctx.logger().info(format!("Hello, {name}"));
///         Ok(())
///     }
/// }
/// ```
pub trait Job: 'static {
    /// The job class name.
    const NAME: &'static str;

    /// Arguments passed from the enqueue site to `perform`: a tuple, a
    /// sequence, or `()`.
    type Arguments: Serialize + DeserializeOwned;

    /// Queue this job is routed to when no override is given.
    fn queue_name() -> Option<&'static str> {
        None
    }

    /// Run the job body.
    fn perform(ctx: &mut ExecutionContext<'_>, args: Self::Arguments) -> DispatchResult<()>;
}

/// Per-enqueue options: queue override and scheduling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnqueueOptions {
    /// Queue to use instead of the job's own queue.
    pub queue: Option<String>,
    /// Delay relative to the time of enqueueing.
    pub wait: Option<TimeDelta>,
    /// Absolute time to run at.
    pub wait_until: Option<DateTime<Utc>>,
    /// Explicit job identifier.
    pub job_id: Option<JobId>,
}

impl EnqueueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route the job to a specific queue.
    pub fn on_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    /// Run the job after the given delay.
    pub fn wait(mut self, wait: TimeDelta) -> Self {
        self.wait = Some(wait);
        self
    }

    /// Run the job at the given time.
    pub fn wait_until(mut self, at: DateTime<Utc>) -> Self {
        self.wait_until = Some(at);
        self
    }

    /// Use the given job ID instead of a generated one.
    pub fn with_job_id(mut self, job_id: impl Into<JobId>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Resolve the scheduled time, if any. A relative `wait` wins over `wait_until`.
    pub fn scheduled_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match (self.wait, self.wait_until) {
            (Some(wait), _) => Some(now + wait),
            (None, at) => at,
        }
    }
}

/// Serialize job arguments into the record's ordered argument list.
///
/// Arguments must serialize to a sequence (a tuple, array or `Vec`), one
/// value per element, or to `()` for an empty list. Single values are
/// wrapped in a one-element tuple by the job type.
pub fn serialize_arguments<T: Serialize>(class: &str, args: &T) -> DispatchResult<Vec<Value>> {
    match serde_json::to_value(args)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(values) => Ok(values),
        other => Err(DispatchError::InvalidArguments {
            class: class.to_string(),
            reason: format!("expected a sequence of arguments, got {other}"),
        }),
    }
}

/// Rebuild typed arguments from a record's argument list.
///
/// The list is always read as a sequence; an empty list also reads as `()`.
pub fn deserialize_arguments<T: DeserializeOwned>(class: &str, args: &[Value]) -> DispatchResult<T> {
    let result = match serde_json::from_value(Value::Array(args.to_vec())) {
        Err(_) if args.is_empty() => serde_json::from_value(Value::Null),
        result => result,
    };

    result.map_err(|e| DispatchError::InvalidArguments {
        class: class.to_string(),
        reason: e.to_string(),
    })
}
