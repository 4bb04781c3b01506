//! Stage/task execution engine.
//!
//! A [`Pipeline`] is an ordered list of named [`Stage`]s. Each stage binds one
//! [`StageRunner`] strategy to the tasks it governs:
//!
//! ```text
//! caller
//!   ↓  Pipeline::run(ctx, &payload)
//! Stage (declared order, stop at first error)
//!   ↓  StageRunner::run(ctx, &payload, &validator)
//! SyncRunner    → one task at a time, stop at first error
//! AsyncRunner   → all accepted tasks at once, aggregate every error
//! BoundedRunner → like AsyncRunner, at most N tasks in flight
//!   ↓  Task::run(ctx, &payload)
//! Payload (shared by reference, interior mutability for writes)
//! ```
//!
//! The engine provides no locking around the payload. Tasks placed in a
//! concurrent stage must touch disjoint parts of it or the payload type must
//! synchronise its own fields.

mod metrics;
#[allow(clippy::module_inception)]
mod pipeline;
mod stage;
pub mod strategies;
mod task;
mod traits;
mod validator;

pub use metrics::PipelineMetrics;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use stage::Stage;
pub use strategies::{AsyncRunner, BoundedRunner, SyncRunner};
pub use task::{FnTask, Payload, SharedTask, Task, TaskResult};
pub use traits::StageRunner;
pub use validator::TaskValidator;
