//! Test support: job assertions over the test adapter and log capture.
//!
//! Assertions return `Result<(), AssertionError>` so tests can use `?`
//! and inspect the failure message.

mod assertions;
mod capture;
mod criteria;

pub use assertions::{AssertionError, Collection, JobAssertions};
pub use capture::{CaptureWriter, LogCapture};
pub use criteria::{CRITERIA_KEYS, IntoCriteria, JobCriteria};
