// UndoableCommand trait definition

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors that can occur during command execution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Command execution failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Undo operation failed
    #[error("Undo failed: {0}")]
    UndoFailed(String),

    /// Invalid state for this operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Trait for commands that support undo/redo
///
/// A command pairs a forward action with its exact inverse over some state `S`.
/// The payload is fixed at construction; `&mut self` is only there so the
/// command can remember whatever it overwrote (e.g. the previous title) in
/// order to restore it on undo.
///
/// # Thread Safety
/// Commands must be Send as they may be moved between threads.
///
/// # Example
/// ```
/// use command_core::command::trait_def::{UndoableCommand, CommandResult, CommandError};
///
/// struct SetCounterCommand {
///     new_value: i64,
///     old_value: Option<i64>,
/// }
///
/// impl UndoableCommand<i64> for SetCounterCommand {
///     fn execute(&mut self, state: &mut i64) -> CommandResult<()> {
///         self.old_value = Some(*state);
///         *state = self.new_value;
///         Ok(())
///     }
///
///     fn undo(&mut self, state: &mut i64) -> CommandResult<()> {
///         let old = self
///             .old_value
///             .ok_or_else(|| CommandError::UndoFailed("No old value stored".into()))?;
///         *state = old;
///         Ok(())
///     }
///
///     fn description(&self) -> String {
///         format!("Set counter to {}", self.new_value)
///     }
/// }
/// ```
pub trait UndoableCommand<S>: Send {
    /// Execute the command
    ///
    /// Should store whatever previous state it needs internally for undo.
    fn execute(&mut self, state: &mut S) -> CommandResult<()>;

    /// Undo the command
    ///
    /// Restores the state to what it was before execute() was called.
    fn undo(&mut self, state: &mut S) -> CommandResult<()>;

    /// Get a human-readable description of the command
    ///
    /// Used for display and error context (e.g., "Undo: Insert 'abc' at 3")
    fn description(&self) -> String;
}

impl<S> std::fmt::Debug for dyn UndoableCommand<S> + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("UndoableCommand")
            .field(&self.description())
            .finish()
    }
}
