//! Demo jobs.

use dispatch_core::{DispatchError, DispatchResult, ExecutionContext, Job, JobRegistry};
use serde_json::Value;

/// Logs its payload.
pub struct EchoJob;

impl Job for EchoJob {
    const NAME: &'static str = "EchoJob";
    type Arguments = (Value,);

    fn perform(ctx: &mut ExecutionContext<'_>, (payload,): Self::Arguments) -> DispatchResult<()> {
        ctx.logger().info(format!("Echo: {payload}"));
        Ok(())
    }
}

/// Enqueues one echo job per requested item.
pub struct FanOutJob;

impl Job for FanOutJob {
    const NAME: &'static str = "FanOutJob";
    type Arguments = (u32,);

    fn queue_name() -> Option<&'static str> {
        Some("fan_out")
    }

    fn perform(ctx: &mut ExecutionContext<'_>, (count,): Self::Arguments) -> DispatchResult<()> {
        for item in 0..count {
            ctx.perform_later::<EchoJob>((serde_json::json!({ "item": item }),))?;
        }
        Ok(())
    }
}

/// Fails unless told otherwise.
pub struct FailJob;

impl Job for FailJob {
    const NAME: &'static str = "FailJob";
    type Arguments = (bool,);

    fn perform(_ctx: &mut ExecutionContext<'_>, (fail,): Self::Arguments) -> DispatchResult<()> {
        if fail {
            Err(DispatchError::failed(Self::NAME, "Intentional failure"))
        } else {
            Ok(())
        }
    }
}

pub fn registry() -> JobRegistry {
    let mut jobs = JobRegistry::new();
    jobs.register::<EchoJob>()
        .register::<FanOutJob>()
        .register::<FailJob>();
    jobs
}
