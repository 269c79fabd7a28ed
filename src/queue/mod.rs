// Serial asynchronous task queue
//
// - Task trait: one asynchronous unit of work, consumed when run
// - AsyncTaskQueue: FIFO, at most one task in flight, one drain per queue
// - TaskHandle: per-task outcome and pre-start cancellation

pub mod handle;
pub mod task;
pub mod task_queue;

pub use handle::TaskHandle;
pub use task::{FnTask, Task, TaskError, TaskId, TaskOutcome, TaskResult, task_fn};
pub use task_queue::{AsyncTaskQueue, QueueStats};
