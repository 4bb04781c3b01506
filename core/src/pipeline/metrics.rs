use std::time::Duration;

use crate::error::{MetricsError, StageError};
use crate::metrics::{CounterVec, HistogramOptions, HistogramVec, Options, Registry};

const NAMESPACE: &str = "indexer";
const SUBSYSTEM: &str = "pipeline";

/// Handles a [`Pipeline`](super::Pipeline) records into after every stage.
#[derive(Clone)]
pub struct PipelineMetrics {
    stage_duration: HistogramVec,
    task_failures: CounterVec,
}

impl PipelineMetrics {
    /// Register the pipeline families on `registry`. Call once per registry.
    pub fn register(registry: &Registry) -> Result<Self, MetricsError> {
        let stage_duration = registry.histogram(
            HistogramOptions::new("stage_duration_seconds", "Duration of pipeline stage runs")
                .namespace(NAMESPACE)
                .subsystem(SUBSYSTEM)
                .tags(["stage", "status"]),
        )?;
        let task_failures = registry.counter(
            Options::new("task_failures_total", "Tasks that returned an error")
                .namespace(NAMESPACE)
                .subsystem(SUBSYSTEM)
                .tags(["stage", "task"]),
        )?;
        Ok(Self {
            stage_duration,
            task_failures,
        })
    }

    pub(crate) fn record_stage(&self, stage: &str, elapsed: Duration, err: Option<&StageError>) {
        let status = if err.is_some() { "error" } else { "ok" };
        if let Ok(h) = self.stage_duration.with_labels(&[stage, status]) {
            h.observe(elapsed.as_secs_f64());
        }
        for failure in err.map(StageError::failures).unwrap_or_default() {
            if let Ok(c) = self.task_failures.with_labels(&[stage, failure.task()]) {
                c.inc();
            }
        }
    }
}
