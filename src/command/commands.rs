// Concrete command implementations

use crate::command::state::Document;
use crate::command::trait_def::{CommandError, CommandResult, UndoableCommand};
use tracing::info;

/// Command carrying only a label
///
/// Executing it journals `Executing: <action>`, undoing it journals
/// `Undoing: <action>`. Useful wherever the side effect lives outside the
/// document and only the ordering matters.
pub struct ActionCommand {
    action: String,
}

impl ActionCommand {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
        }
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

impl UndoableCommand<Document> for ActionCommand {
    fn execute(&mut self, state: &mut Document) -> CommandResult<()> {
        info!(action = %self.action, "executing");
        state.record(format!("Executing: {}", self.action));
        Ok(())
    }

    fn undo(&mut self, state: &mut Document) -> CommandResult<()> {
        info!(action = %self.action, "undoing");
        state.record(format!("Undoing: {}", self.action));
        Ok(())
    }

    fn description(&self) -> String {
        self.action.clone()
    }
}

/// Command to insert text at a byte position
pub struct InsertTextCommand {
    position: usize,
    text: String,
}

impl InsertTextCommand {
    /// Create a new InsertTextCommand
    ///
    /// # Arguments
    /// * `position` - Byte offset to insert at (must be a char boundary)
    /// * `text` - The text to insert
    pub fn new(position: usize, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
        }
    }
}

impl UndoableCommand<Document> for InsertTextCommand {
    fn execute(&mut self, state: &mut Document) -> CommandResult<()> {
        if !state.is_valid_position(self.position) {
            return Err(CommandError::InvalidState(format!(
                "Cannot insert at {} (text is {} bytes)",
                self.position,
                state.len()
            )));
        }

        state.text.insert_str(self.position, &self.text);
        Ok(())
    }

    fn undo(&mut self, state: &mut Document) -> CommandResult<()> {
        let end = self.position.checked_add(self.text.len()).ok_or_else(|| {
            CommandError::UndoFailed(format!(
                "Inserted range at {} overflows the text length",
                self.position
            ))
        })?;
        if state.text.get(self.position..end) != Some(self.text.as_str()) {
            return Err(CommandError::UndoFailed(format!(
                "Text at {}..{} no longer matches inserted text",
                self.position, end
            )));
        }

        state.text.replace_range(self.position..end, "");
        Ok(())
    }

    fn description(&self) -> String {
        format!("Insert '{}' at {}", self.text, self.position)
    }
}

/// Command to delete a byte range of text
///
/// Stores the deleted text to enable undo.
pub struct DeleteTextCommand {
    position: usize,
    len: usize,
    deleted: Option<String>,
}

impl DeleteTextCommand {
    pub fn new(position: usize, len: usize) -> Self {
        Self {
            position,
            len,
            deleted: None,
        }
    }
}

impl UndoableCommand<Document> for DeleteTextCommand {
    fn execute(&mut self, state: &mut Document) -> CommandResult<()> {
        let end = self.position.checked_add(self.len).ok_or_else(|| {
            CommandError::InvalidState(format!(
                "Cannot delete {} bytes at {}: range overflows",
                self.len, self.position
            ))
        })?;
        if !state.is_valid_position(self.position) || !state.is_valid_position(end) {
            return Err(CommandError::InvalidState(format!(
                "Cannot delete {}..{} (text is {} bytes)",
                self.position,
                end,
                state.len()
            )));
        }

        self.deleted = Some(state.text[self.position..end].to_string());
        state.text.replace_range(self.position..end, "");
        Ok(())
    }

    fn undo(&mut self, state: &mut Document) -> CommandResult<()> {
        let deleted = self
            .deleted
            .as_deref()
            .ok_or_else(|| CommandError::UndoFailed("No deleted text stored".into()))?;

        if !state.is_valid_position(self.position) {
            return Err(CommandError::UndoFailed(format!(
                "Cannot restore text at {} (text is {} bytes)",
                self.position,
                state.len()
            )));
        }

        state.text.insert_str(self.position, deleted);
        Ok(())
    }

    fn description(&self) -> String {
        match &self.deleted {
            Some(deleted) => format!("Delete '{}' at {}", deleted, self.position),
            None => format!("Delete {} bytes at {}", self.len, self.position),
        }
    }
}

/// Command to rename the document
///
/// It stores the old title to enable undo.
pub struct SetTitleCommand {
    new_title: String,
    old_title: Option<String>,
}

impl SetTitleCommand {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            new_title: title.into(),
            old_title: None,
        }
    }
}

impl UndoableCommand<Document> for SetTitleCommand {
    fn execute(&mut self, state: &mut Document) -> CommandResult<()> {
        if self.new_title.trim().is_empty() {
            return Err(CommandError::ExecutionFailed("Title cannot be empty".into()));
        }

        self.old_title = Some(std::mem::replace(&mut state.title, self.new_title.clone()));
        Ok(())
    }

    fn undo(&mut self, state: &mut Document) -> CommandResult<()> {
        let old_title = self
            .old_title
            .take()
            .ok_or_else(|| CommandError::UndoFailed("No previous title stored".into()))?;

        state.title = old_title;
        Ok(())
    }

    fn description(&self) -> String {
        format!("Set Title to '{}'", self.new_title)
    }
}
