//! Named binding of one execution strategy.

use crate::context::RunContext;
use crate::error::StageError;

use super::strategies::{AsyncRunner, BoundedRunner, SyncRunner};
use super::task::{Payload, SharedTask};
use super::traits::StageRunner;
use super::validator::TaskValidator;

/// A stage forwards every run to its runner unchanged. Its name only exists
/// for logs and for annotating pipeline errors.
pub struct Stage<P> {
    name: String,
    runner: Box<dyn StageRunner<P>>,
}

impl<P: Payload> Stage<P> {
    pub fn new(name: impl Into<String>, runner: impl StageRunner<P> + 'static) -> Self {
        Self {
            name: name.into(),
            runner: Box::new(runner),
        }
    }

    /// Sequential, fail-fast stage.
    pub fn sync(name: impl Into<String>, tasks: Vec<SharedTask<P>>) -> Self {
        Self::new(name, SyncRunner::new(tasks))
    }

    /// Concurrent, fail-tolerant stage.
    pub fn concurrent(name: impl Into<String>, tasks: Vec<SharedTask<P>>) -> Self {
        Self::new(name, AsyncRunner::new(tasks))
    }

    /// Concurrent, fail-tolerant stage with at most `limit` tasks in flight.
    pub fn bounded(name: impl Into<String>, tasks: Vec<SharedTask<P>>, limit: usize) -> Self {
        Self::new(name, BoundedRunner::new(tasks, limit))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runner(&self) -> &dyn StageRunner<P> {
        self.runner.as_ref()
    }

    pub async fn run(
        &self,
        ctx: &RunContext,
        payload: &P,
        validator: &TaskValidator,
    ) -> Result<(), StageError> {
        self.runner.run(ctx, payload, validator).await
    }
}

impl<P: Payload> std::fmt::Debug for Stage<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("strategy", &self.runner.strategy())
            .field("tasks", &self.runner.tasks().len())
            .finish()
    }
}
