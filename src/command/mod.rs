// Command Pattern for Undo/Redo functionality
//
// This module implements the Command Pattern so reversible edits can be
// undone and redone. All state-changing operations should go through
// UndoableCommand.
//
// Architecture:
// - UndoableCommand trait: Defines execute(), undo(), description()
// - CommandHistory: Manages undo/redo stacks
// - CompositeCommand: Several commands recorded as a single entry
// - Concrete commands: InsertTextCommand, SetTitleCommand, etc. acting on Document

pub mod commands;
pub mod composite;
pub mod manager;
pub mod state;
pub mod trait_def;

pub use composite::CompositeCommand;
pub use manager::{CommandHistory, HistoryError, HistoryOperation, HistoryOutcome};
pub use state::Document;
pub use trait_def::{CommandError, CommandResult, UndoableCommand};
