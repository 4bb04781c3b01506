//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `indexer_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load, load_default, load_from, AppConfig, HealthConfig, HttpConfig, LoggingConfig,
    StoreConfig,
};
pub use crate::context::RunContext;
pub use crate::error::{
    AggregateError, CliError, ConfigError, ContextError, HealthError, MetricsError, PipelineError,
    StageError, TaskFailure,
};
pub use crate::health::{
    CheckStatus, Monitor, PingCheck, Prober, Readiness, ReadinessReport, SizeCheck, StoreClient,
    StoreMetrics, StoreMonitor,
};
pub use crate::metrics::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramOptions, HistogramVec, Options,
    Registry,
};
pub use crate::pipeline::{
    AsyncRunner, BoundedRunner, FnTask, Payload, Pipeline, PipelineBuilder, PipelineMetrics,
    SharedTask, Stage, StageRunner, SyncRunner, Task, TaskResult, TaskValidator,
};
