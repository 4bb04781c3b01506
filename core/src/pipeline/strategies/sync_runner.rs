use std::time::Instant;

use async_trait::async_trait;

use crate::context::RunContext;
use crate::error::{StageError, TaskFailure};
use crate::pipeline::task::{Payload, SharedTask};
use crate::pipeline::traits::StageRunner;
use crate::pipeline::validator::TaskValidator;

/// Runs tasks one after another in declaration order and stops at the first
/// failure.
///
/// Suited to dependency chains (fetch → parse → persist) where a later task
/// must not see a payload left inconsistent by an earlier failure. The error
/// of the failing task is returned unchanged; tasks after it never run.
pub struct SyncRunner<P> {
    tasks: Vec<SharedTask<P>>,
}

impl<P: Payload> SyncRunner<P> {
    pub fn new(tasks: Vec<SharedTask<P>>) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl<P: Payload> StageRunner<P> for SyncRunner<P> {
    async fn run(
        &self,
        ctx: &RunContext,
        payload: &P,
        validator: &TaskValidator,
    ) -> Result<(), StageError> {
        for task in &self.tasks {
            let name = task.name();
            if !validator.should_run(name) {
                tracing::debug!(task = name, "task skipped by validator");
                continue;
            }

            let start = Instant::now();
            if let Err(error) = task.run(ctx, payload).await {
                tracing::warn!(
                    run_id = ctx.run_id(),
                    task = name,
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %error,
                    "task failed, aborting stage"
                );
                return Err(TaskFailure::new(name, error).into());
            }
            tracing::debug!(
                run_id = ctx.run_id(),
                task = name,
                duration_ms = start.elapsed().as_millis() as u64,
                "task completed"
            );
        }
        Ok(())
    }

    fn strategy(&self) -> &'static str {
        "sync"
    }

    fn tasks(&self) -> &[SharedTask<P>] {
        &self.tasks
    }
}
