// Per-task handle returned by AsyncTaskQueue::add

use crate::queue::task::{TaskError, TaskId, TaskOutcome};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Handle onto a submitted task
///
/// Dropping the handle does not affect the task. Awaiting [`outcome`]
/// is how a caller learns that a specific task failed.
///
/// [`outcome`]: TaskHandle::outcome
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    name: String,
    token: CancellationToken,
    outcome: oneshot::Receiver<TaskOutcome>,
}

impl TaskHandle {
    pub(crate) fn new(
        id: TaskId,
        name: String,
        token: CancellationToken,
        outcome: oneshot::Receiver<TaskOutcome>,
    ) -> Self {
        Self {
            id,
            name,
            token,
            outcome,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the queue to skip this task
    ///
    /// Only effective if the task has not started yet; a running task is
    /// always allowed to finish.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the task to settle
    pub async fn outcome(self) -> TaskOutcome {
        self.outcome
            .await
            .unwrap_or(TaskOutcome::Failed(TaskError::Abandoned))
    }
}
