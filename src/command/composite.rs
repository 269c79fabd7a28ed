// CompositeCommand - several commands recorded as one history entry

use crate::command::trait_def::{CommandError, CommandResult, UndoableCommand};
use tracing::warn;

/// Groups commands so they are executed, undone and redone together
///
/// Execution is all-or-nothing: if a child fails, the children that already
/// ran are undone in reverse order before the error is returned. Undo mirrors
/// this: if a child's undo fails, the children already undone are executed
/// again so the group stays fully applied.
pub struct CompositeCommand<S> {
    label: String,
    commands: Vec<Box<dyn UndoableCommand<S>>>,
}

impl<S> CompositeCommand<S> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
        }
    }

    /// Append a child command (builder style)
    pub fn with(mut self, command: Box<dyn UndoableCommand<S>>) -> Self {
        self.commands.push(command);
        self
    }

    pub fn push(&mut self, command: Box<dyn UndoableCommand<S>>) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<S> UndoableCommand<S> for CompositeCommand<S> {
    fn execute(&mut self, state: &mut S) -> CommandResult<()> {
        for index in 0..self.commands.len() {
            if let Err(err) = self.commands[index].execute(state) {
                for done in self.commands[..index].iter_mut().rev() {
                    if let Err(rollback) = done.undo(state) {
                        warn!(
                            composite = %self.label,
                            command = %done.description(),
                            error = %rollback,
                            "rollback of partially executed composite failed"
                        );
                    }
                }
                return Err(CommandError::ExecutionFailed(format!(
                    "{} (step {} of {}): {}",
                    self.commands[index].description(),
                    index + 1,
                    self.commands.len(),
                    err
                )));
            }
        }
        Ok(())
    }

    fn undo(&mut self, state: &mut S) -> CommandResult<()> {
        let len = self.commands.len();
        for index in (0..len).rev() {
            if let Err(err) = self.commands[index].undo(state) {
                for undone in self.commands[index + 1..].iter_mut() {
                    if let Err(reapply) = undone.execute(state) {
                        warn!(
                            composite = %self.label,
                            command = %undone.description(),
                            error = %reapply,
                            "re-applying partially undone composite failed"
                        );
                    }
                }
                return Err(CommandError::UndoFailed(format!(
                    "{} (step {} of {}): {}",
                    self.commands[index].description(),
                    index + 1,
                    len,
                    err
                )));
            }
        }
        Ok(())
    }

    fn description(&self) -> String {
        self.label.clone()
    }
}
