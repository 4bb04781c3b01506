mod async_runner;
mod bounded_runner;
mod sync_runner;

pub use async_runner::AsyncRunner;
pub use bounded_runner::BoundedRunner;
pub use sync_runner::SyncRunner;

use super::task::{Payload, SharedTask};
use super::validator::TaskValidator;

/// Tasks accepted by `validator`, paired with their declaration index.
fn accepted<'a, P: Payload>(
    tasks: &'a [SharedTask<P>],
    validator: &TaskValidator,
) -> Vec<(usize, &'a SharedTask<P>)> {
    tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| {
            let keep = validator.should_run(task.name());
            if !keep {
                tracing::debug!(task = task.name(), "task skipped by validator");
            }
            keep
        })
        .collect()
}
