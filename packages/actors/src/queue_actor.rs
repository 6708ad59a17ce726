//! Queue actor executing dispatched jobs off the caller's thread.

use chrono::Utc;
use dispatch_core::{Dispatcher, JobRecord};
use ractor::{Actor, ActorProcessingErr, ActorRef};

use crate::messages::{QueueMessage, QueueStats};

/// State for the queue actor.
pub struct QueueActorState {
    /// Actor name, used in log lines.
    pub name: String,
    stats: QueueStats,
}

impl QueueActorState {
    /// Create a new queue actor state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stats: QueueStats::default(),
        }
    }

    fn perform(&mut self, job: &JobRecord, dispatcher: &Dispatcher) {
        self.stats.received += 1;

        // Each job starts its own call chain with an empty tag stack.
        match dispatcher.context().execute(job) {
            Ok(()) => self.stats.performed += 1,
            Err(e) => {
                self.stats.failed += 1;
                tracing::warn!(
                    "Job {} ({}) failed on {}: {}",
                    job.job_class(),
                    job.job_id(),
                    self.name,
                    e
                );
            }
        }
    }
}

/// Queue actor that runs jobs one at a time in arrival order.
pub struct QueueActor;

impl Actor for QueueActor {
    type Msg = QueueMessage;
    type State = QueueActorState;
    type Arguments = QueueActorState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting queue actor: {}", args.name);
        Ok(args)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            QueueMessage::Perform { job, dispatcher } => {
                state.perform(&job, &dispatcher);
            }

            QueueMessage::Schedule { job, dispatcher } => {
                let delay = job
                    .scheduled_at()
                    .and_then(|at| (at - Utc::now()).to_std().ok())
                    .unwrap_or_default();

                if delay.is_zero() {
                    state.perform(&job, &dispatcher);
                    return Ok(());
                }

                tracing::debug!(
                    "Holding {} ({}) for {:?}",
                    job.job_class(),
                    job.job_id(),
                    delay
                );
                state.stats.scheduled += 1;

                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if myself
                        .send_message(QueueMessage::Due { job, dispatcher })
                        .is_err()
                    {
                        tracing::warn!("Queue actor stopped before a scheduled job was due");
                    }
                });
            }

            QueueMessage::Due { job, dispatcher } => {
                state.stats.scheduled = state.stats.scheduled.saturating_sub(1);
                state.perform(&job, &dispatcher);
            }

            QueueMessage::GetStats { reply } => {
                let _ = reply.send(state.stats);
            }

            QueueMessage::Shutdown => {
                tracing::info!("Shutting down queue: {}", state.name);
                myself.stop(None);
                return Ok(());
            }
        }

        Ok(())
    }
}
