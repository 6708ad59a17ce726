//! Dispatcher composition root and the per-call-chain execution context.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::adapter::{AdapterRegistry, AdapterSpec, QueueAdapter};
use crate::config::DispatcherConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::events::JobEvent;
use crate::handler::JobRegistry;
use crate::job::{EnqueueOptions, Job, JobRecord, serialize_arguments};
use crate::logging::{HasTags, TagGuard, TagStack, TaggedLogger, job_tags};

/// Composition root: the active adapter, registered jobs and configuration.
///
/// Cloning is cheap; clones share the job and adapter registries. Changing
/// the adapter on one dispatcher does not affect clones or jobs already
/// handed to the previous adapter.
#[derive(Clone)]
pub struct Dispatcher {
    adapter: Arc<dyn QueueAdapter>,
    adapters: Arc<AdapterRegistry>,
    jobs: Arc<JobRegistry>,
    config: DispatcherConfig,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("adapter", &self.adapter.name())
            .field("jobs", &self.jobs.job_classes())
            .field("config", &self.config)
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher using the default adapter registry.
    pub fn new(config: DispatcherConfig, jobs: JobRegistry) -> DispatchResult<Self> {
        Self::with_registry(config, jobs, AdapterRegistry::with_defaults())
    }

    /// Create a dispatcher resolving `config.adapter` through `adapters`.
    pub fn with_registry(
        config: DispatcherConfig,
        jobs: JobRegistry,
        adapters: AdapterRegistry,
    ) -> DispatchResult<Self> {
        let adapter = adapters.resolve(config.adapter.as_str())?;
        tracing::info!("Dispatching jobs through the {} adapter", adapter.name());

        Ok(Self {
            adapter,
            adapters: Arc::new(adapters),
            jobs: Arc::new(jobs),
            config,
        })
    }

    /// Get the active adapter.
    pub fn adapter(&self) -> &Arc<dyn QueueAdapter> {
        &self.adapter
    }

    /// Replace the active adapter, returning the previous one.
    pub fn set_adapter(&mut self, spec: impl Into<AdapterSpec>) -> DispatchResult<Arc<dyn QueueAdapter>> {
        let adapter = self.adapters.resolve(spec)?;
        tracing::debug!(
            "Switching adapter from {} to {}",
            self.adapter.name(),
            adapter.name()
        );
        Ok(std::mem::replace(&mut self.adapter, adapter))
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    pub fn jobs(&self) -> &JobRegistry {
        &self.jobs
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Start a new call chain with an empty tag stack.
    pub fn context(&self) -> ExecutionContext<'_> {
        ExecutionContext::new(self)
    }

    /// Enqueue a job on a fresh call chain.
    pub fn perform_later<J: Job>(&self, args: J::Arguments) -> DispatchResult<JobRecord> {
        self.context().perform_later::<J>(args)
    }

    /// Enqueue a job with options on a fresh call chain.
    pub fn enqueue<J: Job>(&self, args: J::Arguments, options: EnqueueOptions) -> DispatchResult<JobRecord> {
        self.context().enqueue::<J>(args, options)
    }

    /// Run a job immediately on a fresh call chain, bypassing the adapter.
    pub fn perform_now<J: Job>(&self, args: J::Arguments) -> DispatchResult<()> {
        self.context().perform_now::<J>(args)
    }

    /// Build the record for one enqueue request.
    pub fn build_record<J: Job>(
        &self,
        args: &J::Arguments,
        options: &EnqueueOptions,
    ) -> DispatchResult<JobRecord> {
        let queue = self
            .config
            .queue_name(options.queue.as_deref().or(J::queue_name()));
        let mut record = JobRecord::new(J::NAME, serialize_arguments(J::NAME, args)?, queue);

        if let Some(job_id) = &options.job_id {
            record = record.with_job_id(job_id.clone());
        }
        if let Some(at) = options.scheduled_at(Utc::now()) {
            record = record.with_scheduled_at(at);
        }

        Ok(record)
    }
}

/// State carried through one synchronous call chain.
///
/// Holds the tag stack that attributes log lines to the job currently
/// running. Jobs receive the context in `perform` and enqueue or run
/// further jobs through it, so nested executions stack their tags on top of
/// the caller's.
pub struct ExecutionContext<'d> {
    dispatcher: &'d Dispatcher,
    tags: TagStack,
}

impl<'d> ExecutionContext<'d> {
    pub fn new(dispatcher: &'d Dispatcher) -> Self {
        Self {
            dispatcher,
            tags: TagStack::new(),
        }
    }

    pub fn dispatcher(&self) -> &'d Dispatcher {
        self.dispatcher
    }

    pub fn tags(&self) -> &TagStack {
        &self.tags
    }

    /// Logger tagged with the current stack.
    pub fn logger(&self) -> TaggedLogger<'_> {
        TaggedLogger::new(&self.tags)
    }

    /// Enqueue a job for execution as soon as possible.
    pub fn perform_later<J: Job>(&mut self, args: J::Arguments) -> DispatchResult<JobRecord> {
        self.enqueue::<J>(args, EnqueueOptions::default())
    }

    /// Enqueue a job with a queue override, delay or explicit ID.
    pub fn enqueue<J: Job>(&mut self, args: J::Arguments, options: EnqueueOptions) -> DispatchResult<JobRecord> {
        let record = self.dispatcher.build_record::<J>(&args, &options)?;
        self.enqueue_record(record)
    }

    /// Hand a record to the active adapter.
    ///
    /// Scheduled records go through `enqueue_at`; errors from the adapter,
    /// including missing scheduling support, are returned unchanged.
    pub fn enqueue_record(&mut self, job: JobRecord) -> DispatchResult<JobRecord> {
        let dispatcher = self.dispatcher;
        let adapter = &dispatcher.adapter;
        let accepted = job.clone();

        if job.is_scheduled() {
            adapter.enqueue_at(job, self)?;
        } else {
            adapter.enqueue(job, self)?;
        }

        self.log_event(&JobEvent::enqueued(accepted.clone(), adapter.name()));
        Ok(accepted)
    }

    /// Run a job right away in this call chain, without the adapter.
    pub fn perform_now<J: Job>(&mut self, args: J::Arguments) -> DispatchResult<()> {
        let record = self
            .dispatcher
            .build_record::<J>(&args, &EnqueueOptions::default())?;
        self.execute(&record)
    }

    /// Execute a record with its job tags pushed for the duration of the run.
    pub fn execute(&mut self, job: &JobRecord) -> DispatchResult<()> {
        let dispatcher = self.dispatcher;
        let performer = dispatcher
            .jobs
            .get(job.job_class())
            .ok_or_else(|| DispatchError::UnknownJob(job.job_class().to_string()))?;
        let adapter = dispatcher.adapter.name().to_string();

        let mut scope = TagGuard::push(self, job_tags(job));
        scope.log_event(&JobEvent::Performing {
            job: job.clone(),
            adapter: adapter.clone(),
            timestamp: Utc::now(),
        });

        let started = Instant::now();
        let result = performer(&mut *scope, job.args());
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        let event = match &result {
            Ok(()) => JobEvent::Performed {
                job: job.clone(),
                adapter,
                duration_ms,
                timestamp: Utc::now(),
            },
            Err(e) => JobEvent::PerformFailed {
                job: job.clone(),
                adapter,
                duration_ms,
                error: e.to_string(),
                timestamp: Utc::now(),
            },
        };
        scope.log_event(&event);

        result
    }

    fn log_event(&self, event: &JobEvent) {
        let include_arguments = self.dispatcher.config.log_arguments;
        self.logger()
            .log(event.level(), event.description(include_arguments));
    }
}

impl HasTags for ExecutionContext<'_> {
    fn tag_stack(&self) -> &TagStack {
        &self.tags
    }

    fn tag_stack_mut(&mut self) -> &mut TagStack {
        &mut self.tags
    }
}
