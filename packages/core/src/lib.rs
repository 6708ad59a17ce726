//! Core of the job dispatch system.
//!
//! Application code submits jobs through a [`Dispatcher`]; the actual
//! transport is delegated to a swappable [`QueueAdapter`]:
//! - [`InlineAdapter`] runs jobs immediately (the default)
//! - [`TestAdapter`] records jobs in memory for assertions
//! - further adapters are registered in an [`AdapterRegistry`]
//!
//! Job execution is tagged: log lines written while a job runs are prefixed
//! with the class and ID of every job on the current call chain.

mod adapter;
pub mod adapters;
mod config;
mod dispatcher;
mod error;
mod events;
mod handler;
mod job;
pub mod logging;
pub mod testing;

pub use adapter::{AdapterRegistry, AdapterSpec, QueueAdapter, TEST_ADAPTER, adapter_type_name};
pub use adapters::{InlineAdapter, TestAdapter};
pub use config::{
    DispatcherConfig, ENV_ADAPTER, ENV_DEFAULT_QUEUE, ENV_LOG_ARGUMENTS, ENV_QUEUE_PREFIX,
};
pub use dispatcher::{Dispatcher, ExecutionContext};
pub use error::{DispatchError, DispatchResult};
pub use events::JobEvent;
pub use handler::{JobRegistry, Performer};
pub use job::{EnqueueOptions, Job, JobId, JobRecord, deserialize_arguments, serialize_arguments};
pub use logging::{FRAMEWORK_TAG, TagStack, TaggedLogger};
