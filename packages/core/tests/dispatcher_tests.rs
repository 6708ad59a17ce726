mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::*;
use dispatch_core::{
    AdapterRegistry, DispatchError, Dispatcher, DispatcherConfig, ENV_ADAPTER, ENV_DEFAULT_QUEUE,
    ENV_LOG_ARGUMENTS, ENV_QUEUE_PREFIX, InlineAdapter, QueueAdapter, TestAdapter,
};

#[test]
fn test_set_adapter_by_name() {
    let mut dispatcher = Dispatcher::new(DispatcherConfig::default(), registry()).unwrap();
    assert_eq!(dispatcher.adapter().name(), "Inline");

    let previous = dispatcher.set_adapter("test").unwrap();
    assert_eq!(previous.name(), "Inline");
    assert_eq!(dispatcher.adapter().name(), "Test");

    // The reserved name never hands out a shared instance.
    let first = Arc::clone(dispatcher.adapter());
    dispatcher.set_adapter("test").unwrap();
    assert!(!Arc::ptr_eq(&first, dispatcher.adapter()));

    dispatcher.set_adapter("inline").unwrap();
    assert_eq!(dispatcher.adapter().name(), "Inline");
}

#[test]
fn test_set_adapter_unknown_name() {
    let mut dispatcher = Dispatcher::new(DispatcherConfig::default(), registry()).unwrap();

    let err = dispatcher.set_adapter("sidekiq").err().unwrap();
    assert!(matches!(
        err,
        DispatchError::AdapterNotFound { ref type_name, .. } if type_name == "SidekiqAdapter"
    ));
    assert_eq!(err.to_string(), "Adapter not found: 'sidekiq' (looked up as SidekiqAdapter)");
    assert_eq!(dispatcher.adapter().name(), "Inline");
}

#[test]
fn test_unknown_configured_adapter_fails_construction() {
    let config = DispatcherConfig::default().with_adapter("delayed_job");
    let err = Dispatcher::new(config, registry()).err().unwrap();

    assert!(matches!(err, DispatchError::AdapterNotFound { ref type_name, .. } if type_name == "DelayedJobAdapter"));
}

#[test]
fn test_custom_registry() {
    let shared = Arc::new(TestAdapter::new());
    let mut adapters = AdapterRegistry::with_defaults();
    adapters.register_instance("SharedAdapter", shared.clone());
    adapters.register("QuietInlineAdapter", || Arc::new(InlineAdapter::new()));

    let config = DispatcherConfig::default().with_adapter("shared");
    let mut dispatcher = Dispatcher::with_registry(config, registry(), adapters).unwrap();

    dispatcher.perform_later::<HelloJob>(hello("Ada")).unwrap();
    assert_eq!(shared.enqueued_jobs().len(), 1);

    dispatcher.set_adapter("quiet_inline").unwrap();
    dispatcher.perform_later::<HelloJob>(hello("Bob")).unwrap();
    assert_eq!(shared.enqueued_jobs().len(), 1);
}

#[test]
fn test_set_adapter_with_instance() {
    let mut dispatcher = Dispatcher::new(DispatcherConfig::default(), registry()).unwrap();
    let adapter = Arc::new(TestAdapter::new());

    dispatcher.set_adapter(adapter.clone()).unwrap();
    dispatcher.perform_later::<HelloJob>(hello("Ada")).unwrap();

    assert_eq!(adapter.enqueued_jobs().len(), 1);
}

#[test]
fn test_clones_keep_their_adapter() {
    let (dispatcher, jobs) = setup();
    let mut other = dispatcher.clone();
    other.set_adapter("inline").unwrap();

    other.perform_later::<HelloJob>(hello("Ada")).unwrap();
    dispatcher.perform_later::<HelloJob>(hello("Bob")).unwrap();

    jobs.assert_enqueued_jobs(1, None).unwrap();
}

#[test]
fn test_perform_now_bypasses_adapter() {
    let (dispatcher, jobs) = setup();

    dispatcher.perform_now::<HelloJob>(hello("Ada")).unwrap();

    jobs.assert_no_enqueued_jobs(None).unwrap();
    jobs.assert_no_performed_jobs(None).unwrap();

    let err = dispatcher
        .perform_now::<FailingJob>(("boom".to_string(),))
        .unwrap_err();
    assert_eq!(err.to_string(), "FailingJob failed: boom");
}

#[test]
fn test_config_from_lookup() {
    let env: HashMap<&str, &str> = HashMap::from([
        (ENV_ADAPTER, "test"),
        (ENV_DEFAULT_QUEUE, "critical"),
        (ENV_QUEUE_PREFIX, "staging"),
        (ENV_LOG_ARGUMENTS, "false"),
    ]);
    let config = DispatcherConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();

    assert_eq!(config.adapter, "test");
    assert_eq!(config.queue_name(None), "staging_critical");
    assert!(!config.log_arguments);

    let dispatcher = Dispatcher::new(config, registry()).unwrap();
    assert_eq!(dispatcher.adapter().name(), "Test");
    let record = dispatcher.perform_later::<MailerJob>(("ada@example.com".into(), 1)).unwrap();
    assert_eq!(record.queue(), "staging_mailers");
}

#[test]
fn test_config_rejects_bad_flag() {
    let err = DispatcherConfig::from_lookup(|key| (key == ENV_LOG_ARGUMENTS).then(|| "maybe".to_string()))
        .unwrap_err();
    assert!(matches!(err, DispatchError::InvalidConfig(_)));
}

#[test]
fn test_config_from_json() {
    let config: DispatcherConfig = serde_json::from_str(r#"{"adapter": "test", "queue_name_prefix": "app"}"#).unwrap();

    assert_eq!(config.adapter, "test");
    assert_eq!(config.default_queue, "default");
    assert_eq!(config.queue_name(Some("low")), "app_low");
}

#[test]
fn test_invalid_arguments_are_reported() {
    let (dispatcher, jobs) = setup();
    jobs.adapter().set_perform_enqueued_jobs(true);

    let record = dispatch_core::JobRecord::new("HelloJob", vec![serde_json::json!(42)], "default");
    let err = dispatcher.context().enqueue_record(record).unwrap_err();

    assert!(matches!(err, DispatchError::InvalidArguments { ref class, .. } if class == "HelloJob"));
}
