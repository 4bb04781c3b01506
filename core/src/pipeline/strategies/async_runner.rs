use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;

use crate::context::RunContext;
use crate::error::{StageError, TaskFailure};
use crate::pipeline::task::{Payload, SharedTask};
use crate::pipeline::traits::StageRunner;
use crate::pipeline::validator::TaskValidator;

use super::accepted;

/// Launches every accepted task concurrently and waits for all of them.
///
/// A failing task never cancels its siblings. Once every task has finished,
/// all failures are returned together as [`StageError::Aggregate`], listed in
/// declaration order. Tasks share the payload with no locking from the runner.
pub struct AsyncRunner<P> {
    tasks: Vec<SharedTask<P>>,
}

impl<P: Payload> AsyncRunner<P> {
    pub fn new(tasks: Vec<SharedTask<P>>) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl<P: Payload> StageRunner<P> for AsyncRunner<P> {
    async fn run(
        &self,
        ctx: &RunContext,
        payload: &P,
        validator: &TaskValidator,
    ) -> Result<(), StageError> {
        let launched = accepted(&self.tasks, validator);
        if launched.is_empty() {
            return Ok(());
        }

        let outcomes = join_all(launched.into_iter().map(|(_, task)| async move {
            let start = Instant::now();
            let res = task.run(ctx, payload).await;
            tracing::debug!(
                run_id = ctx.run_id(),
                task = task.name(),
                ok = res.is_ok(),
                duration_ms = start.elapsed().as_millis() as u64,
                "task finished"
            );
            (task.name(), res)
        }))
        .await;

        let failures: Vec<TaskFailure> = outcomes
            .into_iter()
            .filter_map(|(name, res)| res.err().map(|error| TaskFailure::new(name, error)))
            .collect();
        if !failures.is_empty() {
            tracing::warn!(
                run_id = ctx.run_id(),
                failed = failures.len(),
                "concurrent stage finished with failures"
            );
        }
        StageError::aggregate(failures)
    }

    fn strategy(&self) -> &'static str {
        "async"
    }

    fn tasks(&self) -> &[SharedTask<P>] {
        &self.tasks
    }
}
