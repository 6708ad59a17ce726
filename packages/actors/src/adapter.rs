//! Queue adapter backed by a [`QueueActor`].

use std::time::Duration;

use dispatch_core::{DispatchError, DispatchResult, ExecutionContext, JobRecord, QueueAdapter};
use ractor::{Actor, ActorRef};
use tokio::task::JoinHandle;

use crate::messages::{ActorError, ActorResult, QueueMessage, QueueStats};
use crate::queue_actor::{QueueActor, QueueActorState};

const STATS_TIMEOUT: Duration = Duration::from_secs(5);

/// Adapter handing jobs to a queue actor.
///
/// Enqueueing never blocks: the record and a clone of the calling
/// dispatcher are sent to the actor, which runs jobs one at a time on its
/// own task. Scheduled jobs are held by the actor until they are due.
///
/// ```ignore
/// let (adapter, _handle) = ActorAdapter::start("jobs").await?;
/// let mut adapters = AdapterRegistry::with_defaults();
/// adapters.register_instance("ActorAdapter", adapter.clone());
/// ```
#[derive(Debug, Clone)]
pub struct ActorAdapter {
    actor: ActorRef<QueueMessage>,
}

impl ActorAdapter {
    /// Spawn a queue actor and wrap it in an adapter.
    pub async fn start(name: impl Into<String>) -> ActorResult<(Self, JoinHandle<()>)> {
        let name = name.into();
        let (actor, handle) = Actor::spawn(Some(name.clone()), QueueActor, QueueActorState::new(name))
            .await
            .map_err(|e| ActorError::Spawn(e.to_string()))?;

        Ok((Self { actor }, handle))
    }

    /// Wrap an already running queue actor.
    pub fn from_actor(actor: ActorRef<QueueMessage>) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &ActorRef<QueueMessage> {
        &self.actor
    }

    /// Fetch the actor's counters.
    ///
    /// Answered after every message already in the actor's mailbox.
    pub async fn stats(&self) -> ActorResult<QueueStats> {
        let result = ractor::rpc::call(&self.actor, |reply| QueueMessage::GetStats { reply }, Some(STATS_TIMEOUT))
            .await
            .map_err(|e| ActorError::Actor(e.to_string()))?;

        match result {
            ractor::rpc::CallResult::Success(stats) => Ok(stats),
            ractor::rpc::CallResult::Timeout => Err(ActorError::Timeout),
            ractor::rpc::CallResult::SenderError => {
                Err(ActorError::Actor("stats reply dropped".to_string()))
            }
        }
    }

    /// Ask the actor to stop after the messages already queued.
    pub fn shutdown(&self) -> ActorResult<()> {
        self.actor
            .send_message(QueueMessage::Shutdown)
            .map_err(|e| ActorError::Actor(e.to_string()))
    }

    fn send(&self, message: QueueMessage) -> DispatchResult<()> {
        self.actor
            .send_message(message)
            .map_err(|e| DispatchError::Adapter(format!("queue actor unavailable: {e}")))
    }
}

impl QueueAdapter for ActorAdapter {
    fn name(&self) -> &str {
        "Actor"
    }

    fn enqueue(&self, job: JobRecord, ctx: &mut ExecutionContext<'_>) -> DispatchResult<()> {
        self.send(QueueMessage::Perform {
            job: Box::new(job),
            dispatcher: ctx.dispatcher().clone(),
        })
    }

    fn enqueue_at(&self, job: JobRecord, ctx: &mut ExecutionContext<'_>) -> DispatchResult<()> {
        self.send(QueueMessage::Schedule {
            job: Box::new(job),
            dispatcher: ctx.dispatcher().clone(),
        })
    }
}
