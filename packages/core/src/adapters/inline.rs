//! Adapter that runs jobs immediately in the calling thread.

use crate::adapter::QueueAdapter;
use crate::dispatcher::ExecutionContext;
use crate::error::DispatchResult;
use crate::job::JobRecord;

/// Executes every job as soon as it is enqueued.
///
/// There is no queue to hold a job until later, so scheduled enqueues are
/// rejected with [`DispatchError::NotImplemented`](crate::DispatchError::NotImplemented)
/// by the trait's default `enqueue_at`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineAdapter;

impl InlineAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl QueueAdapter for InlineAdapter {
    fn name(&self) -> &str {
        "Inline"
    }

    fn enqueue(&self, job: JobRecord, ctx: &mut ExecutionContext<'_>) -> DispatchResult<()> {
        ctx.execute(&job)
    }
}
