// CommandHistory - Manages undo/redo stacks

use crate::command::trait_def::{CommandError, UndoableCommand};
use crate::config::HistoryConfig;
use crate::messaging::channels::{SharedNotificationProducer, send_notification};
use crate::messaging::notification::{Notification, NotificationCategory};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, warn};

/// Default maximum number of commands to keep in history
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Which history operation was running when a command failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOperation {
    Execute,
    Undo,
    Redo,
}

impl fmt::Display for HistoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryOperation::Execute => write!(f, "execute"),
            HistoryOperation::Undo => write!(f, "undo"),
            HistoryOperation::Redo => write!(f, "redo"),
        }
    }
}

/// A command failed while the history was driving it
///
/// The history is already rolled back when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} of '{command}' failed: {source}")]
pub struct HistoryError {
    pub operation: HistoryOperation,
    /// Description of the failing command
    pub command: String,
    #[source]
    pub source: CommandError,
}

pub type HistoryResult = Result<HistoryOutcome, HistoryError>;

/// What a history operation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// The command ran; carries its description
    Applied(String),
    /// Nothing to undo or redo, no state changed
    Noop,
}

impl HistoryOutcome {
    pub fn is_noop(&self) -> bool {
        matches!(self, HistoryOutcome::Noop)
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            HistoryOutcome::Applied(description) => Some(description),
            HistoryOutcome::Noop => None,
        }
    }
}

/// Manages command execution and undo/redo functionality
///
/// The CommandHistory maintains two stacks:
/// - Undo stack: Commands that have been executed and can be undone
/// - Redo stack: Commands that have been undone and can be redone
///
/// When a new command is executed:
/// 1. Execute the command
/// 2. Push it onto the undo stack
/// 3. Clear the redo stack (since we're on a new timeline)
///
/// A failing command never corrupts the stacks: it stays where it was
/// before the operation started.
///
/// # Memory Management
/// The undo stack is limited to `max_history` entries (0 means unbounded).
/// When the limit is reached, the oldest command is removed.
pub struct CommandHistory<S> {
    /// Stack of commands that can be undone (most recent at the back)
    undo_stack: VecDeque<Box<dyn UndoableCommand<S>>>,

    /// Stack of commands that can be redone (most recent at the back)
    redo_stack: VecDeque<Box<dyn UndoableCommand<S>>>,

    /// Maximum number of commands to keep in history
    max_history: usize,

    /// Where failures are reported, if anyone listens
    notifications: Option<SharedNotificationProducer>,
}

impl<S> CommandHistory<S> {
    /// Create a new CommandHistory with default settings
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_HISTORY)
    }

    /// Create a new CommandHistory with a custom history limit
    pub fn with_capacity(max_history: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_history.min(DEFAULT_MAX_HISTORY)),
            redo_stack: VecDeque::new(),
            max_history,
            notifications: None,
        }
    }

    /// Also report command failures into a notification channel
    pub fn with_notifications(mut self, sender: SharedNotificationProducer) -> Self {
        self.notifications = Some(sender);
        self
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::with_capacity(config.max_history)
    }

    /// Execute a command and add it to the undo stack
    ///
    /// This will:
    /// 1. Execute the command
    /// 2. Add it to the undo stack (if successful)
    /// 3. Clear the redo stack (new timeline)
    /// 4. Trim history if needed
    ///
    /// # Errors
    /// Returns an error if the command execution fails. Neither stack is
    /// touched in that case.
    pub fn execute(
        &mut self,
        mut command: Box<dyn UndoableCommand<S>>,
        state: &mut S,
    ) -> HistoryResult {
        let description = command.description();

        if let Err(source) = command.execute(state) {
            return Err(self.fail(HistoryOperation::Execute, description, source));
        }

        self.undo_stack.push_back(command);

        if !self.redo_stack.is_empty() {
            debug!(discarded = self.redo_stack.len(), "clearing redo stack");
            self.redo_stack.clear();
        }

        self.trim();

        debug!(command = %description, undo = self.undo_stack.len(), "executed");
        Ok(HistoryOutcome::Applied(description))
    }

    /// Execute several commands, each as its own history entry
    ///
    /// Stops at the first failure. Commands before it stay in history,
    /// commands after it are dropped without running.
    pub fn execute_batch<I>(&mut self, commands: I, state: &mut S) -> Result<usize, HistoryError>
    where
        I: IntoIterator<Item = Box<dyn UndoableCommand<S>>>,
    {
        let mut executed = 0;
        for command in commands {
            self.execute(command, state)?;
            executed += 1;
        }
        Ok(executed)
    }

    /// Undo the last command
    ///
    /// Pops the last command from the undo stack, undoes it, and pushes it to the redo stack.
    /// Returns [`HistoryOutcome::Noop`] when there is nothing to undo.
    ///
    /// # Errors
    /// Returns an error if the undo operation fails. The command is put
    /// back on the undo stack.
    pub fn undo(&mut self, state: &mut S) -> HistoryResult {
        let Some(mut command) = self.undo_stack.pop_back() else {
            debug!("nothing to undo");
            return Ok(HistoryOutcome::Noop);
        };

        let description = command.description();

        if let Err(source) = command.undo(state) {
            self.undo_stack.push_back(command);
            return Err(self.fail(HistoryOperation::Undo, description, source));
        }

        self.redo_stack.push_back(command);

        debug!(command = %description, redo = self.redo_stack.len(), "undone");
        Ok(HistoryOutcome::Applied(description))
    }

    /// Redo the last undone command
    ///
    /// Pops the last command from the redo stack, executes it again, and pushes it to the undo stack.
    /// Returns [`HistoryOutcome::Noop`] when there is nothing to redo.
    ///
    /// # Errors
    /// Returns an error if the execution fails. The command is put back on
    /// the redo stack.
    pub fn redo(&mut self, state: &mut S) -> HistoryResult {
        let Some(mut command) = self.redo_stack.pop_back() else {
            debug!("nothing to redo");
            return Ok(HistoryOutcome::Noop);
        };

        let description = command.description();

        if let Err(source) = command.execute(state) {
            self.redo_stack.push_back(command);
            return Err(self.fail(HistoryOperation::Redo, description, source));
        }

        self.undo_stack.push_back(command);
        self.trim();

        debug!(command = %description, undo = self.undo_stack.len(), "redone");
        Ok(HistoryOutcome::Applied(description))
    }

    fn fail(
        &self,
        operation: HistoryOperation,
        command: String,
        source: CommandError,
    ) -> HistoryError {
        warn!(%operation, command = %command, error = %source, "command failed");
        let error = HistoryError {
            operation,
            command,
            source,
        };

        if let Some(sender) = &self.notifications {
            let notification = Notification::error(NotificationCategory::History, error.to_string());
            if !send_notification(sender, notification) {
                warn!("notification buffer full, history failure report dropped");
            }
        }
        error
    }

    fn trim(&mut self) {
        if self.max_history == 0 {
            return;
        }
        while self.undo_stack.len() > self.max_history {
            if let Some(dropped) = self.undo_stack.pop_front() {
                debug!(command = %dropped.description(), "history limit reached, dropping oldest");
            }
        }
    }

    /// Check if there are commands that can be undone
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if there are commands that can be redone
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get a description of the command that would be undone
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|cmd| cmd.description())
    }

    /// Get a description of the command that would be redone
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(|cmd| cmd.description())
    }

    /// Clear all command history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get the number of commands in the undo stack
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of commands in the redo stack
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }
}

impl<S> Default for CommandHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for CommandHistory<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHistory")
            .field("undo_stack", &self.undo_stack)
            .field("redo_stack", &self.redo_stack)
            .field("max_history", &self.max_history)
            .field("notifications", &self.notifications.is_some())
            .finish()
    }
}
