use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::ContextError;

/// Cancellation scope threaded through one pipeline run.
///
/// Every task receives the same `RunContext`. Cancellation is cooperative:
/// the engine never aborts a task body, so a task that blocks on I/O should
/// race that work against [`RunContext::cancelled`] (or use
/// [`RunContext::run_until_cancelled`]). Ignoring the context is a bug in the
/// task, not in the engine.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: String,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Bind the context to an externally owned token (e.g. a process-wide
    /// shutdown token).
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Attach a deadline `timeout` from now. An earlier existing deadline wins.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Derive a context that is cancelled when `self` is, but can also be
    /// cancelled on its own without affecting the parent.
    pub fn child(&self) -> Self {
        Self {
            run_id: self.run_id.clone(),
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// Why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn cancelled(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => ContextError::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ContextError::Cancelled
            }
        }
    }

    /// Drive `fut` to completion unless the context finishes first.
    pub async fn run_until_cancelled<F>(&self, fut: F) -> Result<F::Output, ContextError>
    where
        F: Future,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }
        tokio::select! {
            biased;
            err = self.cancelled() => Err(err),
            out = fut => Ok(out),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancel_propagates_to_child() {
        let ctx = RunContext::new();
        let child = ctx.child();
        assert!(child.err().is_none());

        ctx.cancel();
        assert_eq!(child.err(), Some(ContextError::Cancelled));
        assert_eq!(child.cancelled().await, ContextError::Cancelled);
    }

    #[tokio::test]
    async fn test_child_cancel_leaves_parent_live() {
        let ctx = RunContext::new();
        let child = ctx.child();
        child.cancel();

        assert!(child.is_cancelled());
        assert!(!ctx.is_cancelled());
        assert_eq!(child.run_id(), ctx.run_id());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_pending_work() {
        let ctx = RunContext::new().with_timeout(Duration::from_millis(50));
        let res = ctx
            .run_until_cancelled(tokio::time::sleep(Duration::from_secs(60)))
            .await;
        assert_eq!(res, Err(ContextError::DeadlineExceeded));
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_until_cancelled_returns_output() {
        let ctx = RunContext::new().with_run_id("run-1");
        let res = ctx.run_until_cancelled(async { 7 }).await;
        assert_eq!(res, Ok(7));
        assert_eq!(ctx.run_id(), "run-1");
    }

    #[tokio::test]
    async fn test_earlier_deadline_wins() {
        let ctx = RunContext::new()
            .with_timeout(Duration::from_secs(1))
            .with_timeout(Duration::from_secs(60));
        let deadline = ctx.deadline().unwrap();
        assert!(deadline <= Instant::now() + Duration::from_secs(1));
    }
}
