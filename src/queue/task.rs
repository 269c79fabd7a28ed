// Task trait and outcome types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use uuid::Uuid;

/// Unique identifier assigned to every submitted task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a task did not complete successfully
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The task returned an error
    #[error("Task failed: {0}")]
    Failed(String),

    /// The task panicked while running
    #[error("Task panicked: {0}")]
    Panicked(String),

    /// The queue went away before reporting an outcome (runtime shut down)
    #[error("Task outcome lost: queue dropped before the task settled")]
    Abandoned,
}

impl TaskError {
    pub fn failed(message: impl Into<String>) -> Self {
        TaskError::Failed(message.into())
    }
}

pub type TaskResult = Result<(), TaskError>;

/// How a submitted task settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Failed(TaskError),
    /// Cancelled through its handle before it started
    Cancelled,
}

impl TaskOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TaskOutcome::Failed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskOutcome::Cancelled)
    }
}

/// An asynchronous unit of work run by an [`AsyncTaskQueue`]
///
/// The queue consumes the task, so `run` takes `self` by box.
///
/// [`AsyncTaskQueue`]: crate::queue::AsyncTaskQueue
#[async_trait]
pub trait Task: Send + 'static {
    async fn run(self: Box<Self>) -> TaskResult;

    /// Name used in logs and failure reports
    fn name(&self) -> String {
        "task".to_string()
    }
}

/// Adapts a closure returning a future into a [`Task`]
pub struct FnTask<F> {
    name: String,
    f: F,
}

impl<F, Fut> FnTask<F>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F, Fut> Task for FnTask<F>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    async fn run(self: Box<Self>) -> TaskResult {
        let FnTask { f, .. } = *self;
        f().await
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Shorthand for [`FnTask::new`]
pub fn task_fn<F, Fut>(name: impl Into<String>, f: F) -> FnTask<F>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    FnTask::new(name, f)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(TaskResult);

    #[async_trait]
    impl Task for Fixed {
        async fn run(self: Box<Self>) -> TaskResult {
            let Fixed(result) = *self;
            result
        }
    }

    #[tokio::test]
    async fn test_fn_task_runs_closure() {
        let task = task_fn("greet", || async { Ok(()) });
        assert_eq!(task.name(), "greet");
        assert_eq!(Box::new(task).run().await, Ok(()));
    }

    #[tokio::test]
    async fn test_default_name_and_failure() {
        let task = Fixed(Err(TaskError::failed("nope")));
        assert_eq!(task.name(), "task");
        assert_eq!(
            Box::new(task).run().await,
            Err(TaskError::Failed("nope".to_string()))
        );
    }

    #[test]
    fn test_task_ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }

    #[test]
    fn test_outcome_predicates() {
        assert!(TaskOutcome::Completed.is_completed());
        assert!(TaskOutcome::Failed(TaskError::Abandoned).is_failed());
        assert!(TaskOutcome::Cancelled.is_cancelled());
    }
}
