// Document - Mutable state the bundled commands operate on
//
// The history itself is generic over its state; this is the concrete model
// used by the commands in `commands.rs`, the demo binary and the tests.

use serde::{Deserialize, Serialize};

/// A titled text buffer with an action journal
///
/// `journal` records labelled actions (see `ActionCommand`) so their
/// execute/undo order can be observed after the fact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub text: String,
    pub journal: Vec<String>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Length of the text in bytes
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Check that `position` can be used to split the text
    pub fn is_valid_position(&self, position: usize) -> bool {
        position <= self.text.len() && self.text.is_char_boundary(position)
    }

    pub fn record(&mut self, entry: impl Into<String>) {
        self.journal.push(entry.into());
    }
}
