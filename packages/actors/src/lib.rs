//! Actor-backed job execution.
//!
//! This crate provides a Ractor-based [`QueueAdapter`](dispatch_core::QueueAdapter)
//! that runs jobs on a dedicated actor instead of the calling thread.
//!
//! # Architecture
//!
//! - `QueueActor` - Executes jobs in arrival order and keeps counters
//! - `ActorAdapter` - Adapter handle sending records to a queue actor
//!
//! # Usage
//!
//! ```ignore
//! use actors::ActorAdapter;
//!
//! let (adapter, handle) = ActorAdapter::start("jobs").await?;
//! dispatcher.set_adapter(Arc::new(adapter.clone()))?;
//! dispatcher.perform_later::<HelloJob>(("Ada".into(),))?;
//! ```

mod adapter;
mod messages;
mod queue_actor;

pub use adapter::ActorAdapter;
pub use messages::{ActorError, ActorResult, QueueMessage, QueueStats};
pub use queue_actor::{QueueActor, QueueActorState};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef};
