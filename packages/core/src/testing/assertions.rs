//! Count and match assertions over the test adapter's collections.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::criteria::{IntoCriteria, JobCriteria};
use crate::adapter::QueueAdapter;
use crate::adapters::TestAdapter;
use crate::dispatcher::Dispatcher;
use crate::error::DispatchResult;
use crate::job::JobRecord;

/// Which of the test adapter's lists an assertion inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Enqueued,
    Performed,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Enqueued => write!(f, "enqueued"),
            Collection::Performed => write!(f, "performed"),
        }
    }
}

/// Failed or malformed job assertion.
#[derive(Debug, Error)]
pub enum AssertionError {
    #[error("{expected} jobs expected, but {actual} were {collection}{}", only_suffix(.only))]
    CountMismatch {
        expected: usize,
        actual: isize,
        collection: Collection,
        only: Option<String>,
    },

    #[error("No {collection} job found with {criteria}; {collection} jobs: [{}]", describe_jobs(.candidates))]
    NoMatch {
        collection: Collection,
        criteria: JobCriteria,
        candidates: Vec<JobRecord>,
    },

    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),
}

fn only_suffix(only: &Option<String>) -> String {
    only.as_ref()
        .map(|class| format!(" (only {class})"))
        .unwrap_or_default()
}

fn describe_jobs(jobs: &[JobRecord]) -> String {
    jobs.iter()
        .map(|job| {
            let args = job
                .args()
                .iter()
                .map(|arg| arg.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            match job.scheduled_at() {
                Some(at) => format!("{}({}) on {} at {}", job.job_class(), args, job.queue(), at.to_rfc3339()),
                None => format!("{}({}) on {}", job.job_class(), args, job.queue()),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Job assertions bound to a [`TestAdapter`].
///
/// ```ignore
/// let mut dispatcher = Dispatcher::new(DispatcherConfig::default(), jobs)?;
/// let jobs = JobAssertions::install(&mut dispatcher)?;
///
/// dispatcher.perform_later::<HelloJob>(("Ada".into(),))?;
/// jobs.assert_enqueued_jobs(1, None)?;
/// jobs.assert_enqueued_with(JobCriteria::job::<HelloJob>().with_args(vec![json!("Ada")]), || {
///     dispatcher.perform_later::<HelloJob>(("Ada".into(),)).unwrap();
/// })?;
/// ```
///
/// Block variants restore the adapter's flags and collections when they
/// return, including when the block panics.
pub struct JobAssertions {
    adapter: Arc<TestAdapter>,
    previous: Option<Arc<dyn QueueAdapter>>,
}

impl JobAssertions {
    /// Assertions over an existing test adapter.
    pub fn new(adapter: Arc<TestAdapter>) -> Self {
        Self {
            adapter,
            previous: None,
        }
    }

    /// Swap a fresh test adapter into `dispatcher`, remembering the old one.
    pub fn install(dispatcher: &mut Dispatcher) -> DispatchResult<Self> {
        let adapter = Arc::new(TestAdapter::new());
        let previous = dispatcher.set_adapter(Arc::clone(&adapter))?;
        Ok(Self {
            adapter,
            previous: Some(previous),
        })
    }

    /// Put the adapter active before [`install`](Self::install) back.
    pub fn uninstall(self, dispatcher: &mut Dispatcher) -> DispatchResult<()> {
        if let Some(previous) = self.previous {
            dispatcher.set_adapter(previous)?;
        }
        Ok(())
    }

    pub fn adapter(&self) -> &Arc<TestAdapter> {
        &self.adapter
    }

    pub fn enqueued_jobs(&self) -> Vec<JobRecord> {
        self.adapter.enqueued_jobs()
    }

    pub fn performed_jobs(&self) -> Vec<JobRecord> {
        self.adapter.performed_jobs()
    }

    pub fn clear_enqueued_jobs(&self) {
        self.adapter.clear_enqueued_jobs();
    }

    pub fn clear_performed_jobs(&self) {
        self.adapter.clear_performed_jobs();
    }

    /// Run `block` with both perform flags set, then restore their previous values.
    pub fn perform_enqueued_jobs<R>(&self, block: impl FnOnce() -> R) -> R {
        let _flags = PerformFlags::enable(&self.adapter);
        block()
    }

    /// Assert the number of enqueued jobs, optionally only of one class.
    pub fn assert_enqueued_jobs(&self, expected: usize, only: Option<&str>) -> Result<(), AssertionError> {
        let actual = self.count(Collection::Enqueued, only);
        check_count(expected, actual as isize, Collection::Enqueued, only)
    }

    /// Assert that `block` enqueues exactly `expected` jobs.
    pub fn assert_enqueued_jobs_in<F: FnOnce()>(
        &self,
        expected: usize,
        only: Option<&str>,
        block: F,
    ) -> Result<(), AssertionError> {
        let before = self.count(Collection::Enqueued, only);
        block();
        let after = self.count(Collection::Enqueued, only);
        check_count(expected, after as isize - before as isize, Collection::Enqueued, only)
    }

    pub fn assert_no_enqueued_jobs(&self, only: Option<&str>) -> Result<(), AssertionError> {
        self.assert_enqueued_jobs(0, only)
    }

    pub fn assert_no_enqueued_jobs_in<F: FnOnce()>(&self, only: Option<&str>, block: F) -> Result<(), AssertionError> {
        self.assert_enqueued_jobs_in(0, only, block)
    }

    /// Assert the number of performed jobs, optionally only of one class.
    pub fn assert_performed_jobs(&self, expected: usize, only: Option<&str>) -> Result<(), AssertionError> {
        let actual = self.count(Collection::Performed, only);
        check_count(expected, actual as isize, Collection::Performed, only)
    }

    /// Assert that `block`, run with jobs performed immediately, performs
    /// exactly `expected` jobs.
    pub fn assert_performed_jobs_in<F: FnOnce()>(
        &self,
        expected: usize,
        only: Option<&str>,
        block: F,
    ) -> Result<(), AssertionError> {
        let before = self.count(Collection::Performed, only);
        self.perform_enqueued_jobs(block);
        let after = self.count(Collection::Performed, only);
        check_count(expected, after as isize - before as isize, Collection::Performed, only)
    }

    pub fn assert_no_performed_jobs(&self, only: Option<&str>) -> Result<(), AssertionError> {
        self.assert_performed_jobs(0, only)
    }

    pub fn assert_no_performed_jobs_in<F: FnOnce()>(&self, only: Option<&str>, block: F) -> Result<(), AssertionError> {
        self.assert_performed_jobs_in(0, only, block)
    }

    /// Assert that `block` enqueues a job matching `criteria`.
    ///
    /// Only jobs enqueued by the block are considered. Afterwards the
    /// enqueued list holds the jobs from before the block followed by the
    /// block's jobs.
    pub fn assert_enqueued_with<C, F>(&self, criteria: C, block: F) -> Result<(), AssertionError>
    where
        C: IntoCriteria,
        F: FnOnce(),
    {
        let criteria = criteria.into_criteria()?;
        let _restore = RestoreJobs::take(&self.adapter, Collection::Enqueued);
        block();
        self.find_match(Collection::Enqueued, criteria)
    }

    /// Assert that `block`, run with jobs performed immediately, performs a
    /// job matching `criteria`.
    pub fn assert_performed_with<C, F>(&self, criteria: C, block: F) -> Result<(), AssertionError>
    where
        C: IntoCriteria,
        F: FnOnce(),
    {
        let criteria = criteria.into_criteria()?;
        let _restore = RestoreJobs::take(&self.adapter, Collection::Performed);
        self.perform_enqueued_jobs(block);
        self.find_match(Collection::Performed, criteria)
    }

    fn jobs(&self, collection: Collection) -> Vec<JobRecord> {
        jobs_in(&self.adapter, collection)
    }

    fn count(&self, collection: Collection, only: Option<&str>) -> usize {
        self.jobs(collection)
            .iter()
            .filter(|job| only.is_none_or(|class| job.job_class() == class))
            .count()
    }

    fn find_match(&self, collection: Collection, criteria: JobCriteria) -> Result<(), AssertionError> {
        let candidates = self.jobs(collection);
        if candidates.iter().any(|job| criteria.matches(job)) {
            Ok(())
        } else {
            Err(AssertionError::NoMatch {
                collection,
                criteria,
                candidates,
            })
        }
    }
}

fn check_count(
    expected: usize,
    actual: isize,
    collection: Collection,
    only: Option<&str>,
) -> Result<(), AssertionError> {
    if actual == expected as isize {
        Ok(())
    } else {
        Err(AssertionError::CountMismatch {
            expected,
            actual,
            collection,
            only: only.map(str::to_string),
        })
    }
}

fn jobs_in(adapter: &TestAdapter, collection: Collection) -> Vec<JobRecord> {
    match collection {
        Collection::Enqueued => adapter.enqueued_jobs(),
        Collection::Performed => adapter.performed_jobs(),
    }
}

fn set_jobs_in(adapter: &TestAdapter, collection: Collection, jobs: Vec<JobRecord>) {
    match collection {
        Collection::Enqueued => adapter.set_enqueued_jobs(jobs),
        Collection::Performed => adapter.set_performed_jobs(jobs),
    }
}

/// Clears a collection and, on drop, restores it as `original + produced`.
struct RestoreJobs<'a> {
    adapter: &'a TestAdapter,
    collection: Collection,
    original: Vec<JobRecord>,
}

impl<'a> RestoreJobs<'a> {
    fn take(adapter: &'a TestAdapter, collection: Collection) -> Self {
        let original = jobs_in(adapter, collection);
        set_jobs_in(adapter, collection, Vec::new());
        Self {
            adapter,
            collection,
            original,
        }
    }
}

impl Drop for RestoreJobs<'_> {
    fn drop(&mut self) {
        let mut jobs = std::mem::take(&mut self.original);
        jobs.extend(jobs_in(self.adapter, self.collection));
        set_jobs_in(self.adapter, self.collection, jobs);
    }
}

/// Sets both perform flags and restores the previous values on drop.
struct PerformFlags<'a> {
    adapter: &'a TestAdapter,
    previous: (bool, bool),
}

impl<'a> PerformFlags<'a> {
    fn enable(adapter: &'a TestAdapter) -> Self {
        let previous = (adapter.perform_enqueued_jobs(), adapter.perform_enqueued_at_jobs());
        adapter.set_perform_enqueued_jobs(true);
        adapter.set_perform_enqueued_at_jobs(true);
        Self { adapter, previous }
    }
}

impl Drop for PerformFlags<'_> {
    fn drop(&mut self) {
        let (jobs, at_jobs) = self.previous;
        self.adapter.set_perform_enqueued_jobs(jobs);
        self.adapter.set_perform_enqueued_at_jobs(at_jobs);
    }
}
