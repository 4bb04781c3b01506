use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::context::RunContext;

/// Data threaded through every stage of one pipeline run.
///
/// The engine only forwards `&P` and never locks it.
/// Tasks that write to the payload do so through interior mutability, which
/// is why payloads must be `Sync`.
pub trait Payload: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Payload for T {}

pub type TaskResult = anyhow::Result<()>;

/// Atomic unit of work run against a shared payload.
#[async_trait]
pub trait Task<P: Payload>: Send + Sync {
    /// Stable, non-empty name. Used by [`TaskValidator`](super::TaskValidator)
    /// and in every log line and error about this task.
    fn name(&self) -> &str;

    /// Execute against the payload. Long-running work must observe `ctx`
    /// and return promptly once it is cancelled.
    async fn run(&self, ctx: &RunContext, payload: &P) -> TaskResult;
}

/// Tasks are built once at startup and shared by every run.
pub type SharedTask<P> = Arc<dyn Task<P>>;

/// Adapts an async closure into a [`Task`].
///
/// ```ignore
/// let task = FnTask::new("count", |_ctx, p: &Counter| {
///     Box::pin(async move {
///         p.hits.fetch_add(1, Ordering::SeqCst);
///         Ok(())
///     })
/// });
/// ```
pub struct FnTask<P, F> {
    name: String,
    f: F,
    _payload: PhantomData<fn(&P)>,
}

impl<P, F> FnTask<P, F>
where
    P: Payload,
    F: for<'a> Fn(&'a RunContext, &'a P) -> BoxFuture<'a, TaskResult> + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _payload: PhantomData,
        }
    }

    pub fn shared(name: impl Into<String>, f: F) -> SharedTask<P> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<P, F> Task<P> for FnTask<P, F>
where
    P: Payload,
    F: for<'a> Fn(&'a RunContext, &'a P) -> BoxFuture<'a, TaskResult> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &RunContext, payload: &P) -> TaskResult {
        (self.f)(ctx, payload).await
    }
}

impl<P, F> fmt::Debug for FnTask<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTask").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        hits: AtomicUsize,
    }

    #[tokio::test]
    async fn test_fn_task_runs_closure() {
        let task = FnTask::new("count", |_ctx, p: &Counter| {
            Box::pin(async move {
                p.hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        });
        let payload = Counter::default();
        let ctx = RunContext::new();

        task.run(&ctx, &payload).await.unwrap();
        task.run(&ctx, &payload).await.unwrap();

        assert_eq!(task.name(), "count");
        assert_eq!(payload.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fn_task_surfaces_cancellation() {
        let task: SharedTask<Counter> = FnTask::shared("wait", |ctx, _p: &Counter| {
            Box::pin(async move {
                ctx.cancelled().await;
                anyhow::bail!("stopped: {}", ctx.err().map(|e| e.to_string()).unwrap_or_default())
            })
        });
        let ctx = RunContext::new();
        ctx.cancel();

        let err = task.run(&ctx, &Counter::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "stopped: run cancelled");
    }
}
