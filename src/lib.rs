// command_core - Undo/redo command history and a serial async task queue
//
// The two halves are independent:
// - command: CommandHistory over UndoableCommand implementations
// - queue: AsyncTaskQueue running Task implementations one at a time

pub mod command;
pub mod config;
pub mod logging;
pub mod messaging;
pub mod queue;

// Re-export commonly used types for convenience
pub use command::{
    CommandError, CommandHistory, CommandResult, CompositeCommand, Document, HistoryError,
    HistoryOperation, HistoryOutcome, UndoableCommand,
};
pub use config::{ConfigError, CoreConfig};
pub use messaging::channels::create_notification_channel;
pub use messaging::notification::{Notification, NotificationCategory, NotificationLevel};
pub use queue::{AsyncTaskQueue, QueueStats, Task, TaskError, TaskHandle, TaskId, TaskOutcome, task_fn};
