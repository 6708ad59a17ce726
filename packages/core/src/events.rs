//! Lifecycle events logged by the dispatcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::job::JobRecord;

/// Events emitted at fixed points of the enqueue/perform lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JobEvent {
    /// A job was accepted by the adapter for immediate execution.
    Enqueued {
        job: JobRecord,
        adapter: String,
        timestamp: DateTime<Utc>,
    },
    /// A job was accepted by the adapter for later execution.
    EnqueuedAt {
        job: JobRecord,
        adapter: String,
        timestamp: DateTime<Utc>,
    },
    /// A job is about to run.
    Performing {
        job: JobRecord,
        adapter: String,
        timestamp: DateTime<Utc>,
    },
    /// A job finished successfully.
    Performed {
        job: JobRecord,
        adapter: String,
        duration_ms: f64,
        timestamp: DateTime<Utc>,
    },
    /// A job body returned an error.
    PerformFailed {
        job: JobRecord,
        adapter: String,
        duration_ms: f64,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl JobEvent {
    /// Build the enqueue event matching the record's scheduling.
    pub fn enqueued(job: JobRecord, adapter: impl Into<String>) -> Self {
        let adapter = adapter.into();
        let timestamp = Utc::now();
        if job.is_scheduled() {
            JobEvent::EnqueuedAt {
                job,
                adapter,
                timestamp,
            }
        } else {
            JobEvent::Enqueued {
                job,
                adapter,
                timestamp,
            }
        }
    }

    /// Get the job the event refers to.
    pub fn job(&self) -> &JobRecord {
        match self {
            JobEvent::Enqueued { job, .. }
            | JobEvent::EnqueuedAt { job, .. }
            | JobEvent::Performing { job, .. }
            | JobEvent::Performed { job, .. }
            | JobEvent::PerformFailed { job, .. } => job,
        }
    }

    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            JobEvent::Enqueued { timestamp, .. }
            | JobEvent::EnqueuedAt { timestamp, .. }
            | JobEvent::Performing { timestamp, .. }
            | JobEvent::Performed { timestamp, .. }
            | JobEvent::PerformFailed { timestamp, .. } => *timestamp,
        }
    }

    /// Log level the event is written at.
    pub fn level(&self) -> Level {
        match self {
            JobEvent::PerformFailed { .. } => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Render the log line for this event.
    pub fn description(&self, include_arguments: bool) -> String {
        let arguments = |job: &JobRecord| {
            if include_arguments && !job.args().is_empty() {
                format!(" with arguments: {}", format_arguments(job))
            } else {
                String::new()
            }
        };

        match self {
            JobEvent::Enqueued { job, adapter, .. } => format!(
                "Enqueued {} (Job ID: {}) to {}({}){}",
                job.job_class(),
                job.job_id(),
                adapter,
                job.queue(),
                arguments(job)
            ),
            JobEvent::EnqueuedAt { job, adapter, .. } => {
                let at = job
                    .scheduled_at()
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_default();
                format!(
                    "Enqueued {} (Job ID: {}) to {}({}) at {}{}",
                    job.job_class(),
                    job.job_id(),
                    adapter,
                    job.queue(),
                    at,
                    arguments(job)
                )
            }
            JobEvent::Performing { job, adapter, .. } => format!(
                "Performing {} from {}({}){}",
                job.job_class(),
                adapter,
                job.queue(),
                arguments(job)
            ),
            JobEvent::Performed {
                job,
                adapter,
                duration_ms,
                ..
            } => format!(
                "Performed {} from {}({}) in {:.2}ms",
                job.job_class(),
                adapter,
                job.queue(),
                duration_ms
            ),
            JobEvent::PerformFailed {
                job,
                adapter,
                duration_ms,
                error,
                ..
            } => format!(
                "Error performing {} from {}({}) in {:.2}ms: {}",
                job.job_class(),
                adapter,
                job.queue(),
                duration_ms,
                error
            ),
        }
    }
}

fn format_arguments(job: &JobRecord) -> String {
    job.args()
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
