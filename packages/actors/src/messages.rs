//! Message types for actor communication.

use dispatch_core::{Dispatcher, JobRecord};
use ractor::RpcReplyPort;
use serde::{Deserialize, Serialize};

/// Messages for the QueueActor.
#[derive(Debug)]
pub enum QueueMessage {
    /// Run a job as soon as the actor gets to it.
    Perform {
        job: Box<JobRecord>,
        dispatcher: Dispatcher,
    },

    /// Hold a job until its `scheduled_at` time, then perform it.
    Schedule {
        job: Box<JobRecord>,
        dispatcher: Dispatcher,
    },

    /// A scheduled job's timer fired.
    Due {
        job: Box<JobRecord>,
        dispatcher: Dispatcher,
    },

    /// Get queue stats.
    GetStats { reply: RpcReplyPort<QueueStats> },

    /// Shutdown the queue gracefully.
    Shutdown,
}

/// Counters kept by a queue actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Jobs received for immediate execution, including released scheduled jobs.
    pub received: u64,
    /// Jobs currently waiting for their scheduled time.
    pub scheduled: u64,
    /// Jobs that ran to completion.
    pub performed: u64,
    /// Jobs whose body returned an error.
    pub failed: u64,
}

impl QueueStats {
    /// Jobs neither finished nor waiting on a timer.
    pub fn pending(&self) -> u64 {
        self.received.saturating_sub(self.performed + self.failed)
    }
}

/// Result type for actor operations.
pub type ActorResult<T> = Result<T, ActorError>;

/// Error type for actor operations.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error("Failed to spawn actor: {0}")]
    Spawn(String),

    #[error("Actor error: {0}")]
    Actor(String),

    #[error("Timeout")]
    Timeout,
}
