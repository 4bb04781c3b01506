use std::time::Instant;

use async_trait::async_trait;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;

use crate::context::RunContext;
use crate::error::{StageError, TaskFailure};
use crate::pipeline::task::{Payload, SharedTask};
use crate::pipeline::traits::StageRunner;
use crate::pipeline::validator::TaskValidator;

use super::accepted;

/// Fail-tolerant concurrent runner with a cap on tasks in flight.
///
/// Same contract as [`AsyncRunner`](super::AsyncRunner): every accepted task
/// runs exactly once and all failures are aggregated. At most `limit` tasks
/// run at the same time; a limit of 0 is treated as 1.
pub struct BoundedRunner<P> {
    tasks: Vec<SharedTask<P>>,
    limit: usize,
}

impl<P: Payload> BoundedRunner<P> {
    pub fn new(tasks: Vec<SharedTask<P>>, limit: usize) -> Self {
        Self {
            tasks,
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[async_trait]
impl<P: Payload> StageRunner<P> for BoundedRunner<P> {
    async fn run(
        &self,
        ctx: &RunContext,
        payload: &P,
        validator: &TaskValidator,
    ) -> Result<(), StageError> {
        let sem = Semaphore::new(self.limit);
        let mut futs = FuturesUnordered::new();

        for (index, task) in accepted(&self.tasks, validator) {
            let sem = &sem;
            futs.push(async move {
                let name = task.name();
                let _permit = match sem.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (index, name, Err(anyhow::anyhow!("semaphore closed unexpectedly")))
                    }
                };
                let start = Instant::now();
                let res = task.run(ctx, payload).await;
                tracing::debug!(
                    run_id = ctx.run_id(),
                    task = name,
                    ok = res.is_ok(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "task finished"
                );
                (index, name, res)
            });
        }

        let mut failures = Vec::new();
        while let Some((index, name, res)) = futs.next().await {
            if let Err(error) = res {
                failures.push((index, TaskFailure::new(name, error)));
            }
        }
        failures.sort_by_key(|(index, _)| *index);

        StageError::aggregate(failures.into_iter().map(|(_, f)| f).collect())
    }

    fn strategy(&self) -> &'static str {
        "bounded"
    }

    fn tasks(&self) -> &[SharedTask<P>] {
        &self.tasks
    }
}
