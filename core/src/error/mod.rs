#[allow(clippy::module_inception)]
pub mod error;
pub mod health;
pub mod pipeline;

pub use error::{CliError, ConfigError, ContextError};
pub use health::{HealthError, MetricsError};
pub use pipeline::{AggregateError, PipelineError, StageError, TaskFailure};
