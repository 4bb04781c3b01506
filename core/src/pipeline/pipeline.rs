use std::time::Instant;

use crate::context::RunContext;
use crate::error::PipelineError;

use super::metrics::PipelineMetrics;
use super::stage::Stage;
use super::task::Payload;
use super::validator::TaskValidator;

/// Ordered sequence of stages run end to end for one payload.
///
/// Built once at startup and reused for every run. Stages run strictly in
/// declaration order; the first failing stage aborts the run and its error is
/// returned annotated with the stage name.
pub struct Pipeline<P> {
    stages: Vec<Stage<P>>,
    metrics: Option<PipelineMetrics>,
}

impl<P: Payload> Pipeline<P> {
    pub fn new(stages: Vec<Stage<P>>) -> Self {
        Self {
            stages,
            metrics: None,
        }
    }

    pub fn builder() -> PipelineBuilder<P> {
        PipelineBuilder::new()
    }

    pub fn stages(&self) -> &[Stage<P>] {
        &self.stages
    }

    /// Run every stage, executing every task.
    pub async fn run(&self, ctx: &RunContext, payload: &P) -> Result<(), PipelineError> {
        self.run_with_validator(ctx, payload, &TaskValidator::all())
            .await
    }

    /// Run every stage, executing only the tasks `validator` accepts.
    pub async fn run_with_validator(
        &self,
        ctx: &RunContext,
        payload: &P,
        validator: &TaskValidator,
    ) -> Result<(), PipelineError> {
        let run_start = Instant::now();
        tracing::info!(
            run_id = ctx.run_id(),
            stages = self.stages.len(),
            "pipeline run started"
        );

        for stage in &self.stages {
            let start = Instant::now();
            tracing::debug!(
                run_id = ctx.run_id(),
                stage = stage.name(),
                strategy = stage.runner().strategy(),
                "stage started"
            );

            let res = stage.run(ctx, payload, validator).await;
            let elapsed = start.elapsed();
            if let Some(metrics) = &self.metrics {
                metrics.record_stage(stage.name(), elapsed, res.as_ref().err());
            }

            if let Err(err) = res {
                tracing::error!(
                    run_id = ctx.run_id(),
                    stage = stage.name(),
                    failed_tasks = ?err.failed_tasks(),
                    duration_ms = elapsed.as_millis() as u64,
                    error = %err,
                    "stage failed, aborting pipeline run"
                );
                return Err(PipelineError::new(stage.name(), err));
            }
            tracing::info!(
                run_id = ctx.run_id(),
                stage = stage.name(),
                duration_ms = elapsed.as_millis() as u64,
                "stage completed"
            );
        }

        tracing::info!(
            run_id = ctx.run_id(),
            duration_ms = run_start.elapsed().as_millis() as u64,
            "pipeline run completed"
        );
        Ok(())
    }
}

pub struct PipelineBuilder<P> {
    stages: Vec<Stage<P>>,
    metrics: Option<PipelineMetrics>,
}

impl<P: Payload> PipelineBuilder<P> {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            metrics: None,
        }
    }

    pub fn stage(mut self, stage: Stage<P>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Pipeline<P> {
        Pipeline {
            stages: self.stages,
            metrics: self.metrics,
        }
    }
}

impl<P: Payload> Default for PipelineBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}
