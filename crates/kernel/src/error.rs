use crate::scheduler::TaskId;

/// Failure reported by a task's `execute`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    #[error("task {name} failed: {reason}")]
    Failed { name: String, reason: String },
    #[error("animation target {0} no longer exists")]
    MissingTarget(String),
}

/// Errors from running the task queue.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulerError {
    /// The remaining tasks of that step were not run.
    #[error("task {id:?} aborted the step: {source}")]
    TaskFailed {
        id: TaskId,
        #[source]
        source: TaskError,
    },
}
