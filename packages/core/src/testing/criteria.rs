//! Partial job records used by field-match assertions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::AssertionError;
use crate::job::{Job, JobRecord};

/// Keys accepted when criteria are given as a JSON object.
pub const CRITERIA_KEYS: [&str; 4] = ["job_class", "args", "queue", "scheduled_at"];

/// Any subset of a record's matchable fields.
///
/// A record matches when every field that is set compares equal.
/// `scheduled_at` has three states: unset (any record), `Some(None)`
/// (only immediate records, JSON `null`) and `Some(Some(at))`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
}

/// Read a field that is present in the input, keeping an explicit `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl JobCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria matching a job type.
    pub fn job<J: Job>() -> Self {
        Self::new().with_job_class(J::NAME)
    }

    pub fn with_job_class(mut self, job_class: impl Into<String>) -> Self {
        self.job_class = Some(job_class.into());
        self
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = Some(args);
        self
    }

    pub fn on_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    pub fn at(mut self, scheduled_at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(Some(scheduled_at));
        self
    }

    /// Only match records without a scheduled time.
    pub fn immediate(mut self) -> Self {
        self.scheduled_at = Some(None);
        self
    }

    /// Parse criteria from a JSON object, rejecting unknown keys.
    pub fn from_json(value: Value) -> Result<Self, AssertionError> {
        let Value::Object(map) = &value else {
            return Err(AssertionError::InvalidCriteria(format!(
                "expected an object, got {value}"
            )));
        };

        if let Some(key) = map.keys().find(|key| !CRITERIA_KEYS.contains(&key.as_str())) {
            return Err(AssertionError::InvalidCriteria(format!(
                "unknown key `{key}`, expected one of {}",
                CRITERIA_KEYS.join(", ")
            )));
        }

        if let Some(key) = ["job_class", "args", "queue"]
            .into_iter()
            .find(|key| map.get(*key).is_some_and(Value::is_null))
        {
            return Err(AssertionError::InvalidCriteria(format!("`{key}` cannot be null")));
        }

        serde_json::from_value(value).map_err(|e| AssertionError::InvalidCriteria(e.to_string()))
    }

    /// Check whether every supplied field equals the record's.
    pub fn matches(&self, job: &JobRecord) -> bool {
        self.job_class.as_deref().is_none_or(|c| c == job.job_class())
            && self.args.as_deref().is_none_or(|a| a == job.args())
            && self.queue.as_deref().is_none_or(|q| q == job.queue())
            && self.scheduled_at.is_none_or(|at| at == job.scheduled_at())
    }
}

impl fmt::Display for JobCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// Conversion into validated criteria.
pub trait IntoCriteria {
    fn into_criteria(self) -> Result<JobCriteria, AssertionError>;
}

impl IntoCriteria for JobCriteria {
    fn into_criteria(self) -> Result<JobCriteria, AssertionError> {
        Ok(self)
    }
}

impl IntoCriteria for Value {
    fn into_criteria(self) -> Result<JobCriteria, AssertionError> {
        JobCriteria::from_json(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_match() {
        let job = JobRecord::new("HelloJob", vec![json!("Ada")], "default");

        assert!(JobCriteria::new().matches(&job));
        assert!(JobCriteria::new().with_job_class("HelloJob").matches(&job));
        assert!(
            JobCriteria::new()
                .with_job_class("HelloJob")
                .with_args(vec![json!("Ada")])
                .on_queue("default")
                .matches(&job)
        );
        assert!(!JobCriteria::new().with_args(vec![json!("Bob")]).matches(&job));
        assert!(!JobCriteria::new().at(Utc::now()).matches(&job));
        assert!(JobCriteria::new().immediate().matches(&job));
    }

    #[test]
    fn test_null_scheduled_at_means_immediate() {
        let at = Utc::now();
        let immediate = JobRecord::new("HelloJob", vec![], "default");
        let scheduled = immediate.clone().with_scheduled_at(at);

        let criteria = JobCriteria::from_json(json!({"job_class": "HelloJob", "scheduled_at": null})).unwrap();
        assert_eq!(criteria, JobCriteria::new().with_job_class("HelloJob").immediate());
        assert!(criteria.matches(&immediate));
        assert!(!criteria.matches(&scheduled));
        assert_eq!(criteria.to_string(), r#"{"job_class":"HelloJob","scheduled_at":null}"#);

        let any = JobCriteria::from_json(json!({"job_class": "HelloJob"})).unwrap();
        assert_eq!(any.scheduled_at, None);
        assert!(any.matches(&immediate) && any.matches(&scheduled));

        assert!(JobCriteria::new().at(at).matches(&scheduled));
        assert!(!JobCriteria::new().immediate().matches(&scheduled));
    }

    #[test]
    fn test_from_json_rejects_null_fields() {
        for key in ["job_class", "args", "queue"] {
            let mut map = serde_json::Map::new();
            map.insert(key.to_string(), Value::Null);
            let err = JobCriteria::from_json(Value::Object(map)).unwrap_err();
            assert!(
                matches!(err, AssertionError::InvalidCriteria(ref msg) if msg.contains(key)),
                "{key}: {err}"
            );
        }
    }

    #[test]
    fn test_from_json_rejects_unknown_keys() {
        let err = JobCriteria::from_json(json!({"job_class": "HelloJob", "foo": 1})).unwrap_err();
        assert!(matches!(err, AssertionError::InvalidCriteria(ref msg) if msg.contains("`foo`")));

        let err = JobCriteria::from_json(json!(["HelloJob"])).unwrap_err();
        assert!(matches!(err, AssertionError::InvalidCriteria(_)));
    }

    #[test]
    fn test_from_json_accepts_known_keys() {
        let criteria = JobCriteria::from_json(json!({
            "job_class": "HelloJob",
            "args": ["Ada"],
            "queue": "low",
            "scheduled_at": "2030-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(criteria.job_class.as_deref(), Some("HelloJob"));
        assert_eq!(criteria.args, Some(vec![json!("Ada")]));
        assert!(criteria.scheduled_at.is_some());
        assert_eq!(
            criteria.to_string(),
            r#"{"job_class":"HelloJob","args":["Ada"],"queue":"low","scheduled_at":"2030-01-01T00:00:00Z"}"#
        );
    }
}
