use async_trait::async_trait;

use crate::context::RunContext;
use crate::error::StageError;

use super::task::{Payload, SharedTask};
use super::validator::TaskValidator;

/// Execution strategy for the ordered task list of one stage.
///
/// Implementations decide ordering, concurrency and failure policy; stages
/// and pipelines only see this trait, so new strategies plug in without
/// touching them.
#[async_trait]
pub trait StageRunner<P: Payload>: Send + Sync {
    /// Run every task accepted by `validator` against `payload`.
    async fn run(
        &self,
        ctx: &RunContext,
        payload: &P,
        validator: &TaskValidator,
    ) -> Result<(), StageError>;

    /// Short label for logs, e.g. `"sync"`.
    fn strategy(&self) -> &'static str {
        "custom"
    }

    /// Tasks in declaration order.
    fn tasks(&self) -> &[SharedTask<P>] {
        &[]
    }
}
