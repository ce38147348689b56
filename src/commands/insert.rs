use serde::{Deserialize, Serialize};

use super::{Command, CommandResult};
use crate::context::EditorContext;
use crate::error::CommandError;
use crate::text;

/// Inserts `text` at `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertText {
    position: usize,
    text: String,
}

impl InsertText {
    pub fn new(position: usize, text: impl Into<String>) -> Self {
        InsertText {
            position,
            text: text.into(),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn end(&self) -> Option<usize> {
        self.position.checked_add(text::len(&self.text))
    }

    /// True when `other` continues typing right where this insert ended.
    pub fn can_merge(&self, other: &Self) -> bool {
        self.end() == Some(other.position)
    }

    pub fn merge(&mut self, other: Self) {
        self.text.push_str(&other.text);
    }

    fn insert(&self, context: &mut dyn EditorContext) -> Result<String, CommandError> {
        let current = context.content();
        let splice = text::splice(current, self.position, 0, &self.text).ok_or_else(|| {
            CommandError::precondition(format!(
                "insert position {} is past the end of the buffer ({} characters)",
                self.position,
                text::len(current)
            ))
        })?;

        let cursor = self.position + text::len(&self.text);
        context.apply(splice.content.clone(), cursor)?;
        Ok(splice.content)
    }

    fn remove(&self, context: &mut dyn EditorContext) -> Result<String, CommandError> {
        let splice = text::splice(context.content(), self.position, text::len(&self.text), "")
            .filter(|splice| splice.removed == self.text)
            .ok_or_else(|| {
                CommandError::precondition(format!(
                    "buffer no longer holds the inserted text at {}",
                    self.position
                ))
            })?;

        context.apply(splice.content.clone(), self.position)?;
        Ok(splice.content)
    }
}

impl Command for InsertText {
    fn execute(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        self.insert(context).into()
    }

    fn undo(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        self.remove(context).into()
    }
}
