use std::fmt;

use thiserror::Error;

/// A single task's error, tagged with the task that produced it.
#[derive(Debug)]
pub struct TaskFailure {
    task: String,
    error: anyhow::Error,
}

impl TaskFailure {
    pub fn new(task: impl Into<String>, error: anyhow::Error) -> Self {
        Self {
            task: task.into(),
            error,
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    /// The error exactly as the task returned it.
    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    pub fn into_error(self) -> anyhow::Error {
        self.error
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task `{}` failed: {}", self.task, self.error)
    }
}

impl std::error::Error for TaskFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let inner: &(dyn std::error::Error + 'static) = self.error.as_ref();
        Some(inner)
    }
}

/// Every failure collected from a concurrently executed stage.
///
/// Never empty: runners only build one when at least one task failed.
/// Failures are listed in task declaration order.
#[derive(Debug)]
pub struct AggregateError {
    failures: Vec<TaskFailure>,
}

impl AggregateError {
    pub(crate) fn new(failures: Vec<TaskFailure>) -> Self {
        debug_assert!(!failures.is_empty());
        Self { failures }
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[TaskFailure] {
        &self.failures
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaskFailure> {
        self.failures.iter()
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.failures.iter().map(TaskFailure::task).collect()
    }

    /// First failure reported by the task called `task`.
    pub fn get(&self, task: &str) -> Option<&TaskFailure> {
        self.failures.iter().find(|f| f.task == task)
    }

    pub fn into_failures(self) -> Vec<TaskFailure> {
        self.failures
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} task(s) failed", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{}: {}", failure.task, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

impl<'a> IntoIterator for &'a AggregateError {
    type Item = &'a TaskFailure;
    type IntoIter = std::slice::Iter<'a, TaskFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

/// Error returned by a [`StageRunner`](crate::pipeline::StageRunner).
#[derive(Error, Debug)]
pub enum StageError {
    /// Fail-fast strategies stop at the first failing task.
    #[error(transparent)]
    Task(#[from] TaskFailure),

    /// Fail-tolerant strategies report every failing task.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl StageError {
    /// `Ok(())` when `failures` is empty, an aggregate otherwise.
    pub fn aggregate(failures: Vec<TaskFailure>) -> Result<(), StageError> {
        if failures.is_empty() {
            Ok(())
        } else {
            Err(StageError::Aggregate(AggregateError::new(failures)))
        }
    }

    pub fn failures(&self) -> &[TaskFailure] {
        match self {
            StageError::Task(failure) => std::slice::from_ref(failure),
            StageError::Aggregate(agg) => agg.failures(),
        }
    }

    pub fn failed_tasks(&self) -> Vec<&str> {
        self.failures().iter().map(TaskFailure::task).collect()
    }
}

/// A stage error annotated with the stage that produced it.
#[derive(Error, Debug)]
#[error("stage `{stage}` failed: {source}")]
pub struct PipelineError {
    stage: String,
    #[source]
    source: StageError,
}

impl PipelineError {
    pub fn new(stage: impl Into<String>, source: StageError) -> Self {
        Self {
            stage: stage.into(),
            source,
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn stage_error(&self) -> &StageError {
        &self.source
    }

    pub fn failures(&self) -> &[TaskFailure] {
        self.source.failures()
    }

    pub fn into_stage_error(self) -> StageError {
        self.source
    }
}
