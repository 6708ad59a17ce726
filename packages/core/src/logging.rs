//! Tag-stack logging for nested job execution.
//!
//! Every job execution pushes two tags, the job class and the job ID, and
//! pops them again when the execution scope ends. Log lines written while a
//! job runs carry the whole stack as a prefix:
//!
//! ```text
//! [JobDispatch] [NestedJob] [NESTED-JOB-ID] Enqueued LoggingJob (Job ID: ...) to Test(default)
//! [JobDispatch] [NestedJob] [NESTED-JOB-ID] [LoggingJob] [LOGGING-JOB-ID] Performing LoggingJob from Test(default)
//! ```

use std::fmt::Display;
use std::ops::{Deref, DerefMut};

use tracing::Level;

use crate::job::JobRecord;

/// Tag applied outside all job tags, identifying this subsystem.
pub const FRAMEWORK_TAG: &str = "JobDispatch";

/// `tracing` target of all tagged log lines.
pub const LOG_TARGET: &str = "dispatch_core";

/// Ordered stack of log tags, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagStack {
    tags: Vec<String>,
}

impl TagStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.tags.pop()
    }

    /// Drop every tag above `depth`.
    pub fn truncate(&mut self, depth: usize) {
        self.tags.truncate(depth);
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Render the prefix for a log line, framework tag first.
    pub fn prefix(&self) -> String {
        std::iter::once(FRAMEWORK_TAG)
            .chain(self.tags.iter().map(String::as_str))
            .map(|tag| format!("[{tag}]"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// The two tags pushed for a job execution: class, then formatted job ID.
pub fn job_tags(job: &JobRecord) -> [String; 2] {
    [job.job_class().to_string(), job.job_id().tag()]
}

/// Anything that carries a tag stack.
pub trait HasTags {
    fn tag_stack(&self) -> &TagStack;
    fn tag_stack_mut(&mut self) -> &mut TagStack;
}

impl HasTags for TagStack {
    fn tag_stack(&self) -> &TagStack {
        self
    }

    fn tag_stack_mut(&mut self) -> &mut TagStack {
        self
    }
}

/// Scope guard that pops the tags it pushed when dropped.
///
/// The guard dereferences to its owner, so the owner stays usable (including
/// for further nested scopes) while the tags are in place. Tags are removed on
/// normal exit, on early return and while unwinding from a panic.
pub struct TagGuard<'a, T: HasTags> {
    owner: &'a mut T,
    depth: usize,
}

impl<'a, T: HasTags> TagGuard<'a, T> {
    /// Push `tags` onto the owner's stack for the lifetime of the guard.
    pub fn push<I>(owner: &'a mut T, tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let stack = owner.tag_stack_mut();
        let depth = stack.len();
        for tag in tags {
            stack.push(tag);
        }
        Self { owner, depth }
    }
}

impl<T: HasTags> Deref for TagGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.owner
    }
}

impl<T: HasTags> DerefMut for TagGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.owner
    }
}

impl<T: HasTags> Drop for TagGuard<'_, T> {
    fn drop(&mut self) {
        self.owner.tag_stack_mut().truncate(self.depth);
    }
}

/// Logger that prefixes every line with the current tag stack.
///
/// Lines are written through `tracing` on [`LOG_TARGET`].
#[derive(Debug, Clone, Copy)]
pub struct TaggedLogger<'a> {
    tags: &'a TagStack,
}

impl<'a> TaggedLogger<'a> {
    pub fn new(tags: &'a TagStack) -> Self {
        Self { tags }
    }

    pub fn log(&self, level: Level, message: impl Display) {
        let line = format!("{} {}", self.tags.prefix(), message);
        match level {
            Level::ERROR => tracing::error!(target: LOG_TARGET, "{line}"),
            Level::WARN => tracing::warn!(target: LOG_TARGET, "{line}"),
            Level::INFO => tracing::info!(target: LOG_TARGET, "{line}"),
            Level::DEBUG => tracing::debug!(target: LOG_TARGET, "{line}"),
            _ => tracing::trace!(target: LOG_TARGET, "{line}"),
        }
    }

    pub fn debug(&self, message: impl Display) {
        self.log(Level::DEBUG, message);
    }

    pub fn info(&self, message: impl Display) {
        self.log(Level::INFO, message);
    }

    pub fn warn(&self, message: impl Display) {
        self.log(Level::WARN, message);
    }

    pub fn error(&self, message: impl Display) {
        self.log(Level::ERROR, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_renders_framework_tag_first() {
        let mut stack = TagStack::new();
        assert_eq!(stack.prefix(), "[JobDispatch]");

        stack.push("NestedJob");
        stack.push("NESTED-ID");
        assert_eq!(stack.prefix(), "[JobDispatch] [NestedJob] [NESTED-ID]");
    }

    #[test]
    fn test_guards_unwind_in_reverse() {
        let mut stack = TagStack::new();
        {
            let mut outer = TagGuard::push(&mut stack, ["Outer", "OUTER-ID"]);
            {
                let inner = TagGuard::push(&mut *outer, ["Inner", "INNER-ID"]);
                assert_eq!(inner.tags(), ["Outer", "OUTER-ID", "Inner", "INNER-ID"]);
            }
            assert_eq!(outer.tags(), ["Outer", "OUTER-ID"]);
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn test_guard_pops_on_panic() {
        let mut stack = TagStack::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = TagGuard::push(&mut stack, ["Failing", "ID"]);
            panic!("job blew up");
        }));
        assert!(result.is_err());
        assert!(stack.is_empty());
    }

    #[test]
    fn test_guard_drops_tags_pushed_inside_its_scope() {
        let mut stack = TagStack::new();
        {
            let mut guard = TagGuard::push(&mut stack, ["Job", "ID"]);
            guard.push("stray");
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn test_job_tags() {
        let job = JobRecord::new("LoggingJob", vec![], "default").with_job_id("logging-job-id");
        assert_eq!(job_tags(&job), ["LoggingJob".to_string(), "LOGGING-JOB-ID".to_string()]);
    }
}
