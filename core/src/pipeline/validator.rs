use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

type Predicate = dyn Fn(&str) -> bool + Send + Sync;

/// Per-run predicate deciding which tasks execute.
///
/// Consulted once per task, right before the task would run. A rejected task
/// is skipped silently: it is not a failure and the stage carries on as if
/// the task were absent. The default validator accepts every task.
#[derive(Clone, Default)]
pub struct TaskValidator {
    predicate: Option<Arc<Predicate>>,
}

impl TaskValidator {
    /// Accept every task.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Some(Arc::new(predicate)),
        }
    }

    /// Accept only the named tasks, e.g. to re-process a subset.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: HashSet<String> = names.into_iter().map(Into::into).collect();
        Self::new(move |name| names.contains(name))
    }

    /// Accept everything except the named tasks.
    pub fn except<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: HashSet<String> = names.into_iter().map(Into::into).collect();
        Self::new(move |name| !names.contains(name))
    }

    pub fn should_run(&self, task: &str) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(task),
            None => true,
        }
    }

    pub fn accepts_all(&self) -> bool {
        self.predicate.is_none()
    }
}

impl fmt::Debug for TaskValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.accepts_all() { "all" } else { "custom" };
        f.debug_tuple("TaskValidator").field(&kind).finish()
    }
}
