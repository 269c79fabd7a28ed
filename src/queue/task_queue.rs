// AsyncTaskQueue - runs tasks one at a time in submission order

use crate::config::QueueConfig;
use crate::messaging::channels::{
    NotificationConsumer, SharedNotificationProducer, create_notification_channel,
    send_notification,
};
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::queue::handle::TaskHandle;
use crate::queue::task::{FnTask, Task, TaskError, TaskId, TaskOutcome, TaskResult};
use serde::Serialize;
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{Notify, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Running totals for one queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
}

struct QueuedTask {
    id: TaskId,
    name: String,
    task: Box<dyn Task>,
    token: CancellationToken,
    reply: oneshot::Sender<TaskOutcome>,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueuedTask>,
    /// True while a drain future exists for this queue
    draining: bool,
    running: Option<TaskId>,
    stats: QueueStats,
}

struct Shared {
    name: String,
    state: Mutex<QueueState>,
    idle: Notify,
    notifications: Option<SharedNotificationProducer>,
}

impl Shared {
    // Never held across an await; a poisoned lock still holds consistent data
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, id: TaskId, name: &str, outcome: &TaskOutcome) {
        {
            let mut state = self.lock_state();
            state.running = None;
            match outcome {
                TaskOutcome::Completed => state.stats.completed += 1,
                TaskOutcome::Failed(_) => state.stats.failed += 1,
                TaskOutcome::Cancelled => state.stats.cancelled += 1,
            }
        }

        match outcome {
            TaskOutcome::Completed => {
                debug!(queue = %self.name, task_id = %id, task = %name, "task completed");
            }
            TaskOutcome::Cancelled => {
                debug!(queue = %self.name, task_id = %id, task = %name, "task cancelled before start");
            }
            TaskOutcome::Failed(error) => {
                warn!(queue = %self.name, task_id = %id, task = %name, error = %error, "task failed");
                if let Some(sender) = &self.notifications {
                    let message = format!(
                        "[{}] task '{}' ({}) failed: {}",
                        self.name, name, id, error
                    );
                    if !send_notification(
                        sender,
                        Notification::error(NotificationCategory::Queue, message),
                    ) {
                        warn!(queue = %self.name, "notification buffer full, failure report dropped");
                    }
                }
            }
        }
    }
}

/// Serialises asynchronous tasks: at most one runs at a time, in FIFO order
///
/// [`add`] never waits for the task; it appends to the pending sequence and,
/// if no drain is active, spawns one on the runtime the queue was built on.
/// The drain pops one task, awaits it to completion (success, failure or
/// panic), then moves on. When nothing is left it stops; the next `add`
/// starts a new one.
///
/// Cloning gives another handle onto the same queue.
///
/// There is no timeout: a task that never settles stalls every task behind it.
///
/// [`add`]: AsyncTaskQueue::add
#[derive(Clone)]
pub struct AsyncTaskQueue {
    shared: Arc<Shared>,
    runtime: Handle,
}

impl AsyncTaskQueue {
    /// Create a queue on the current Tokio runtime
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime, like `tokio::spawn`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(name.into(), Handle::current(), None)
    }

    /// Create a queue whose drains run on `runtime`
    pub fn with_runtime(name: impl Into<String>, runtime: Handle) -> Self {
        Self::build(name.into(), runtime, None)
    }

    /// Create a queue that also reports failures into a notification channel
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime, like `tokio::spawn`.
    pub fn with_notifications(name: impl Into<String>, sender: SharedNotificationProducer) -> Self {
        Self::build(name.into(), Handle::current(), Some(sender))
    }

    /// Create a queue and its failure notification channel from config
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime, like `tokio::spawn`.
    pub fn from_config(config: &QueueConfig) -> (Self, NotificationConsumer) {
        let (tx, rx) = create_notification_channel(config.notification_capacity);
        let queue = Self::with_notifications(config.name.clone(), Arc::new(Mutex::new(tx)));
        (queue, rx)
    }

    fn build(
        name: String,
        runtime: Handle,
        notifications: Option<SharedNotificationProducer>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                name,
                state: Mutex::new(QueueState::default()),
                idle: Notify::new(),
                notifications,
            }),
            runtime,
        }
    }

    /// Submit a task; returns immediately
    pub fn add<T: Task>(&self, task: T) -> TaskHandle {
        self.add_boxed(Box::new(task))
    }

    /// Submit a closure returning a future
    pub fn add_fn<F, Fut>(&self, name: impl Into<String>, f: F) -> TaskHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        self.add(FnTask::new(name, f))
    }

    pub fn add_boxed(&self, task: Box<dyn Task>) -> TaskHandle {
        let id = TaskId::new();
        let name = task.name();
        let token = CancellationToken::new();
        let (reply, outcome) = oneshot::channel();

        let start_drain = {
            let mut state = self.shared.lock_state();
            state.pending.push_back(QueuedTask {
                id,
                name: name.clone(),
                task,
                token: token.clone(),
                reply,
            });
            state.stats.submitted += 1;
            !std::mem::replace(&mut state.draining, true)
        };

        debug!(queue = %self.shared.name, task_id = %id, task = %name, "task queued");

        if start_drain {
            debug!(queue = %self.shared.name, "drain started");
            self.runtime.spawn(drain(Arc::clone(&self.shared)));
        }

        TaskHandle::new(id, name, token, outcome)
    }

    /// Resolve once nothing is pending or running
    pub async fn wait_idle(&self) {
        loop {
            let mut notified = std::pin::pin!(self.shared.idle.notified());
            notified.as_mut().enable();
            if !self.is_draining() {
                return;
            }
            notified.await;
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Number of tasks waiting to start (the running one is not counted)
    pub fn pending_count(&self) -> usize {
        self.shared.lock_state().pending.len()
    }

    pub fn is_draining(&self) -> bool {
        self.shared.lock_state().draining
    }

    pub fn is_idle(&self) -> bool {
        !self.is_draining()
    }

    pub fn running_task(&self) -> Option<TaskId> {
        self.shared.lock_state().running
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.lock_state().stats
    }
}

impl fmt::Debug for AsyncTaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock_state();
        f.debug_struct("AsyncTaskQueue")
            .field("name", &self.shared.name)
            .field("pending", &state.pending.len())
            .field("draining", &state.draining)
            .field("stats", &state.stats)
            .finish()
    }
}

/// Resets the drain state if the drain future is dropped before it finishes
///
/// That happens when the runtime shuts down mid-drain, or is already shut
/// down when the drain is spawned. Tasks still pending can never run, so
/// they are dropped and their handles resolve as abandoned.
struct DrainGuard {
    shared: Arc<Shared>,
    finished: bool,
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let abandoned = {
            let mut state = self.shared.lock_state();
            let abandoned = std::mem::take(&mut state.pending);
            let lost = abandoned.len() as u64 + u64::from(state.running.is_some());
            state.stats.failed += lost;
            state.draining = false;
            state.running = None;
            abandoned
        };

        warn!(
            queue = %self.shared.name,
            abandoned = abandoned.len(),
            "drain stopped before the queue emptied"
        );
        drop(abandoned);
        self.shared.idle.notify_waiters();
    }
}

// Not an `async fn`: the guard must exist even if the future is never polled
fn drain(shared: Arc<Shared>) -> impl Future<Output = ()> + Send + 'static {
    let guard = DrainGuard {
        shared,
        finished: false,
    };

    async move {
        let mut guard = guard;
        loop {
            let next = {
                let mut state = guard.shared.lock_state();
                match state.pending.pop_front() {
                    Some(next) => {
                        state.running = Some(next.id);
                        next
                    }
                    None => {
                        state.draining = false;
                        state.running = None;
                        guard.finished = true;
                        break;
                    }
                }
            };

            let QueuedTask {
                id,
                name,
                task,
                token,
                reply,
            } = next;

            let outcome = if token.is_cancelled() {
                TaskOutcome::Cancelled
            } else {
                debug!(queue = %guard.shared.name, task_id = %id, task = %name, "task started");
                match run_isolated(task).await {
                    Ok(()) => TaskOutcome::Completed,
                    Err(error) => TaskOutcome::Failed(error),
                }
            };

            guard.shared.settle(id, &name, &outcome);
            // The caller may have dropped its handle
            let _ = reply.send(outcome);
        }

        debug!(queue = %guard.shared.name, "queue drained");
        guard.shared.idle.notify_waiters();
    }
}

// Runs the task on its own spawned future so a panic cannot take the drain down
async fn run_isolated(task: Box<dyn Task>) -> TaskResult {
    match tokio::spawn(task.run()).await {
        Ok(result) => result,
        Err(err) if err.is_panic() => Err(TaskError::Panicked(panic_message(err.into_panic()))),
        Err(err) => Err(TaskError::Failed(err.to_string())),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::channels::drain_notifications;
    use async_trait::async_trait;
    use std::time::Duration;

    struct PanickingTask;

    #[async_trait]
    impl Task for PanickingTask {
        async fn run(self: Box<Self>) -> TaskResult {
            panic!("task exploded")
        }

        fn name(&self) -> String {
            "panics".to_string()
        }
    }

    #[tokio::test]
    async fn test_add_returns_before_task_runs() {
        let queue = AsyncTaskQueue::new("test");
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let handle = queue.add_fn("blocked", || async move {
            release_rx.await.map_err(|e| TaskError::failed(e.to_string()))
        });

        assert!(queue.is_draining());
        assert_eq!(queue.stats().submitted, 1);

        release_tx.send(()).unwrap();
        assert_eq!(handle.outcome().await, TaskOutcome::Completed);
        queue.wait_idle().await;
        assert!(queue.is_idle());
        assert_eq!(queue.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_on_empty_queue_returns() {
        let queue = AsyncTaskQueue::new("empty");
        queue.wait_idle().await;
        assert_eq!(queue.stats(), QueueStats::default());
    }

    #[tokio::test]
    async fn test_failure_is_reported_on_handle() {
        let queue = AsyncTaskQueue::new("test");

        let failing = queue.add_fn("fails", || async { Err(TaskError::failed("boom")) });
        let after = queue.add_fn("after", || async { Ok(()) });

        assert_eq!(
            failing.outcome().await,
            TaskOutcome::Failed(TaskError::Failed("boom".to_string()))
        );
        assert!(after.outcome().await.is_completed());

        let stats = queue.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.completed, 1);
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_stall_queue() {
        let queue = AsyncTaskQueue::new("test");

        let panicking = queue.add(PanickingTask);
        let after = queue.add_fn("after", || async { Ok(()) });

        assert_eq!(
            panicking.outcome().await,
            TaskOutcome::Failed(TaskError::Panicked("task exploded".to_string()))
        );
        assert!(after.outcome().await.is_completed());
        queue.wait_idle().await;
        assert!(!queue.is_draining());
    }

    #[tokio::test]
    async fn test_cancelled_task_is_skipped() {
        let queue = AsyncTaskQueue::new("test");
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let ran = Arc::new(Mutex::new(false));

        let first = queue.add_fn("first", || async move {
            release_rx.await.map_err(|e| TaskError::failed(e.to_string()))
        });
        let ran_flag = Arc::clone(&ran);
        let second = queue.add_fn("second", move || async move {
            *ran_flag.lock().unwrap() = true;
            Ok(())
        });

        second.cancel();
        assert!(second.is_cancelled());
        release_tx.send(()).unwrap();

        assert!(first.outcome().await.is_completed());
        assert!(second.outcome().await.is_cancelled());
        assert!(!*ran.lock().unwrap());
        assert_eq!(queue.stats().cancelled, 1);
    }

    #[tokio::test]
    async fn test_failures_land_in_notification_channel() {
        let config = QueueConfig {
            name: "uploads".to_string(),
            notification_capacity: 8,
        };
        let (queue, mut notifications) = AsyncTaskQueue::from_config(&config);

        queue.add_fn("upload-1", || async { Err(TaskError::failed("timeout")) });
        queue.add_fn("upload-2", || async { Ok(()) });
        queue.wait_idle().await;

        let received = drain_notifications(&mut notifications);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].category, NotificationCategory::Queue);
        assert!(received[0].message.starts_with("[uploads] task 'upload-1'"));
        assert!(received[0].message.ends_with("Task failed: timeout"));
    }

    #[tokio::test]
    async fn test_drain_restarts_after_idle() {
        let queue = AsyncTaskQueue::new("test");

        queue.add_fn("one", || async { Ok(()) });
        queue.wait_idle().await;
        assert!(queue.is_idle());

        let handle = queue.add_fn("two", || async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(())
        });
        assert!(queue.is_draining());
        assert!(handle.outcome().await.is_completed());
        queue.wait_idle().await;
        assert_eq!(queue.stats().completed, 2);
    }

    fn current_thread_runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_runtime_shutdown_mid_task_clears_draining() {
        let rt = current_thread_runtime();
        let queue = AsyncTaskQueue::with_runtime("doomed", rt.handle().clone());

        let stuck = queue.add_fn("never settles", std::future::pending::<TaskResult>);
        let waiting = queue.add_fn("behind", || async { Ok(()) });

        rt.block_on(async {
            while queue.running_task().is_none() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        });
        assert!(queue.is_draining());

        drop(rt);

        assert!(!queue.is_draining());
        assert_eq!(queue.running_task(), None);
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(queue.stats().failed, 2);

        let other = current_thread_runtime();
        other.block_on(async {
            assert_eq!(
                stuck.outcome().await,
                TaskOutcome::Failed(TaskError::Abandoned)
            );
            assert_eq!(
                waiting.outcome().await,
                TaskOutcome::Failed(TaskError::Abandoned)
            );
            queue.wait_idle().await;
        });
    }

    #[test]
    fn test_add_after_runtime_shutdown_does_not_stick() {
        let rt = current_thread_runtime();
        let queue = AsyncTaskQueue::with_runtime("gone", rt.handle().clone());
        drop(rt);

        let handle = queue.add_fn("late", || async { Ok(()) });

        assert!(!queue.is_draining());
        assert_eq!(queue.pending_count(), 0);
        current_thread_runtime().block_on(async {
            assert_eq!(handle.outcome().await, TaskOutcome::Failed(TaskError::Abandoned));
            queue.wait_idle().await;
        });
    }

    #[tokio::test]
    async fn test_clones_share_one_queue() {
        let queue = AsyncTaskQueue::new("shared");
        let other = queue.clone();

        other.add_fn("from clone", || async { Ok(()) });
        queue.wait_idle().await;

        assert_eq!(queue.stats().completed, 1);
        assert_eq!(other.name(), "shared");
    }
}
