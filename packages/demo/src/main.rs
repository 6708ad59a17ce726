//! Runs a handful of jobs through the actor adapter.

mod jobs;

use std::sync::Arc;
use std::time::Duration;

use actors::ActorAdapter;
use chrono::TimeDelta;
use dispatch_core::{AdapterRegistry, Dispatcher, DispatcherConfig, ENV_ADAPTER, EnqueueOptions};
use tracing_subscriber::EnvFilter;

use crate::jobs::{EchoJob, FailJob, FanOutJob};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Default to the actor adapter unless the environment picks another one.
    let config = DispatcherConfig::from_lookup(|key| {
        std::env::var(key)
            .ok()
            .or_else(|| (key == ENV_ADAPTER).then(|| "actor".to_string()))
    })?;

    let (adapter, handle) = ActorAdapter::start("jobs").await?;
    let mut adapters = AdapterRegistry::with_defaults();
    adapters.register_instance("ActorAdapter", Arc::new(adapter.clone()));

    let dispatcher = Dispatcher::with_registry(config, jobs::registry(), adapters)?;

    dispatcher.perform_later::<EchoJob>((serde_json::json!({ "message": "hello" }),))?;
    dispatcher.perform_later::<FanOutJob>((3,))?;
    dispatcher.perform_later::<FailJob>((true,))?;

    match dispatcher.enqueue::<EchoJob>(
        (serde_json::json!("later"),),
        EnqueueOptions::new().wait(TimeDelta::milliseconds(500)),
    ) {
        Ok(_) => {}
        Err(e) if e.is_not_implemented() => {
            tracing::warn!("{} adapter cannot schedule jobs, skipping", dispatcher.adapter().name());
        }
        Err(e) => return Err(e.into()),
    }

    let mut stats = adapter.stats().await?;
    for _ in 0..50 {
        if stats.pending() == 0 && stats.scheduled == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        stats = adapter.stats().await?;
    }

    tracing::info!(
        "Done: {} received, {} performed, {} failed, {} still scheduled",
        stats.received,
        stats.performed,
        stats.failed,
        stats.scheduled
    );

    adapter.shutdown()?;
    handle.await?;
    Ok(())
}
