#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::Value;

use dispatch_core::testing::JobAssertions;
use dispatch_core::{
    DispatchError, DispatchResult, Dispatcher, DispatcherConfig, EnqueueOptions, ExecutionContext,
    Job, JobRegistry,
};

pub struct HelloJob;

impl Job for HelloJob {
    const NAME: &'static str = "HelloJob";
    type Arguments = (String,);

    fn perform(ctx: &mut ExecutionContext<'_>, (name,): Self::Arguments) -> DispatchResult<()> {
        ctx.logger().info(format!("{name} says hello"));
        Ok(())
    }
}

pub struct LoggingJob;

impl Job for LoggingJob {
    const NAME: &'static str = "LoggingJob";
    type Arguments = (String,);

    fn perform(ctx: &mut ExecutionContext<'_>, (dummy,): Self::Arguments) -> DispatchResult<()> {
        ctx.logger().info(format!("Dummy, here is it: {dummy}"));
        Ok(())
    }
}

/// Logs its single JSON payload as received.
pub struct EchoJob;

impl Job for EchoJob {
    const NAME: &'static str = "EchoJob";
    type Arguments = (Value,);

    fn perform(ctx: &mut ExecutionContext<'_>, (payload,): Self::Arguments) -> DispatchResult<()> {
        ctx.logger().info(format!("Echo: {payload}"));
        Ok(())
    }
}

/// Enqueues a `LoggingJob` with a fixed job ID from inside its own body.
pub struct NestedJob;

impl Job for NestedJob {
    const NAME: &'static str = "NestedJob";
    type Arguments = ();

    fn perform(ctx: &mut ExecutionContext<'_>, _args: ()) -> DispatchResult<()> {
        ctx.enqueue::<LoggingJob>(
            ("NestedJob".to_string(),),
            EnqueueOptions::new().with_job_id("logging-job-id"),
        )?;
        Ok(())
    }
}

pub struct FailingJob;

impl Job for FailingJob {
    const NAME: &'static str = "FailingJob";
    type Arguments = (String,);

    fn perform(_ctx: &mut ExecutionContext<'_>, (reason,): Self::Arguments) -> DispatchResult<()> {
        Err(DispatchError::failed(Self::NAME, reason))
    }
}

pub struct MailerJob;

impl Job for MailerJob {
    const NAME: &'static str = "MailerJob";
    type Arguments = (String, u32);

    fn queue_name() -> Option<&'static str> {
        Some("mailers")
    }

    fn perform(_ctx: &mut ExecutionContext<'_>, _args: Self::Arguments) -> DispatchResult<()> {
        Ok(())
    }
}

pub fn registry() -> JobRegistry {
    let mut registry = JobRegistry::new();
    registry
        .register::<HelloJob>()
        .register::<LoggingJob>()
        .register::<EchoJob>()
        .register::<NestedJob>()
        .register::<FailingJob>()
        .register::<MailerJob>();
    registry
}

/// Dispatcher with a freshly installed test adapter.
pub fn setup() -> (Dispatcher, JobAssertions) {
    setup_with(registry())
}

pub fn setup_with(registry: JobRegistry) -> (Dispatcher, JobAssertions) {
    let mut dispatcher = Dispatcher::new(DispatcherConfig::default(), registry).expect("dispatcher");
    let jobs = JobAssertions::install(&mut dispatcher).expect("test adapter");
    (dispatcher, jobs)
}

/// Shared list that closure jobs record observations into.
#[derive(Clone, Default)]
pub struct Recorder<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone> Recorder<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push(&self, item: T) {
        self.items.lock().unwrap().push(item);
    }

    pub fn items(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }
}

pub fn hello(name: &str) -> (String,) {
    (name.to_string(),)
}
