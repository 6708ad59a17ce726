//! In-memory adapter for tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::adapter::QueueAdapter;
use crate::dispatcher::ExecutionContext;
use crate::error::DispatchResult;
use crate::job::JobRecord;

#[derive(Debug, Default)]
struct TestAdapterState {
    enqueued: Vec<JobRecord>,
    performed: Vec<JobRecord>,
    perform_enqueued_jobs: bool,
    perform_enqueued_at_jobs: bool,
}

/// Adapter that records jobs instead of handing them to a broker.
///
/// By default every record lands in the enqueued list. With
/// `perform_enqueued_jobs` set, immediate jobs are recorded as performed and
/// run synchronously; scheduled jobs additionally need
/// `perform_enqueued_at_jobs`.
///
/// The lock is never held while a job runs, so jobs may enqueue further jobs
/// through the same adapter.
#[derive(Debug, Default)]
pub struct TestAdapter {
    state: Mutex<TestAdapterState>,
}

impl TestAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TestAdapterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Jobs recorded as enqueued, in insertion order.
    pub fn enqueued_jobs(&self) -> Vec<JobRecord> {
        self.lock().enqueued.clone()
    }

    /// Replace the enqueued list.
    pub fn set_enqueued_jobs(&self, jobs: Vec<JobRecord>) {
        self.lock().enqueued = jobs;
    }

    /// Jobs recorded as performed, in insertion order.
    pub fn performed_jobs(&self) -> Vec<JobRecord> {
        self.lock().performed.clone()
    }

    /// Replace the performed list.
    pub fn set_performed_jobs(&self, jobs: Vec<JobRecord>) {
        self.lock().performed = jobs;
    }

    pub fn clear_enqueued_jobs(&self) {
        self.lock().enqueued.clear();
    }

    pub fn clear_performed_jobs(&self) {
        self.lock().performed.clear();
    }

    pub fn perform_enqueued_jobs(&self) -> bool {
        self.lock().perform_enqueued_jobs
    }

    pub fn set_perform_enqueued_jobs(&self, perform: bool) {
        self.lock().perform_enqueued_jobs = perform;
    }

    pub fn perform_enqueued_at_jobs(&self) -> bool {
        self.lock().perform_enqueued_at_jobs
    }

    pub fn set_perform_enqueued_at_jobs(&self, perform: bool) {
        self.lock().perform_enqueued_at_jobs = perform;
    }

    fn route(&self, job: JobRecord, perform: bool, ctx: &mut ExecutionContext<'_>) -> DispatchResult<()> {
        if perform {
            self.lock().performed.push(job.clone());
            ctx.execute(&job)
        } else {
            self.lock().enqueued.push(job);
            Ok(())
        }
    }
}

impl QueueAdapter for TestAdapter {
    fn name(&self) -> &str {
        "Test"
    }

    fn enqueue(&self, job: JobRecord, ctx: &mut ExecutionContext<'_>) -> DispatchResult<()> {
        let perform = {
            let state = self.lock();
            state.perform_enqueued_jobs && (!job.is_scheduled() || state.perform_enqueued_at_jobs)
        };
        self.route(job, perform, ctx)
    }

    fn enqueue_at(&self, job: JobRecord, ctx: &mut ExecutionContext<'_>) -> DispatchResult<()> {
        let perform = {
            let state = self.lock();
            state.perform_enqueued_jobs && state.perform_enqueued_at_jobs
        };
        self.route(job, perform, ctx)
    }
}
