use serde::{Deserialize, Serialize};

use super::{Command, CommandResult};
use crate::context::EditorContext;
use crate::error::CommandError;
use crate::text;

/// Removes `length` characters starting at `start`.
///
/// The removed text is captured on the first successful execute so the
/// command can put it back on undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteText {
    start: usize,
    length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deleted_text: Option<String>,
}

impl DeleteText {
    pub fn new(start: usize, length: usize) -> Self {
        DeleteText {
            start,
            length,
            deleted_text: None,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn deleted_text(&self) -> Option<&str> {
        self.deleted_text.as_deref()
    }

    fn is_forward_of(&self, other: &Self) -> bool {
        other.start == self.start
    }

    fn is_backspace_of(&self, other: &Self) -> bool {
        other.start.checked_add(other.length) == Some(self.start)
    }

    /// True for repeated forward deletes at the same spot, or repeated
    /// backspaces ending where this delete began.
    pub fn can_merge(&self, other: &Self) -> bool {
        self.deleted_text.is_some()
            && other.deleted_text.is_some()
            && (self.is_forward_of(other) || self.is_backspace_of(other))
    }

    pub fn merge(&mut self, other: Self) {
        let forward = self.is_forward_of(&other);
        let deleted = self.deleted_text.take().unwrap_or_default();
        let theirs = other.deleted_text.unwrap_or_default();

        self.deleted_text = Some(if forward {
            deleted + &theirs
        } else {
            self.start = other.start;
            theirs + &deleted
        });
        self.length = self.length.saturating_add(other.length);
    }

    /// Checks a restored delete: it must carry exactly `length` removed characters.
    ///
    /// # Errors
    ///
    /// Will return `Err` with the reason if the record cannot be undone and redone
    pub fn validate_restored(&self) -> Result<(), String> {
        match &self.deleted_text {
            None => Err("deletedText is missing".to_string()),
            Some(deleted) if text::len(deleted) != self.length => Err(format!(
                "deletedText has {} characters but length is {}",
                text::len(deleted),
                self.length
            )),
            Some(_) => Ok(()),
        }
    }

    fn delete(&mut self, context: &mut dyn EditorContext) -> Result<String, CommandError> {
        let current = context.content();
        let splice = text::splice(current, self.start, self.length, "").ok_or_else(|| {
            CommandError::precondition(format!(
                "delete range {}..{} exceeds buffer length {}",
                self.start,
                self.start.saturating_add(self.length),
                text::len(current)
            ))
        })?;

        if let Some(expected) = &self.deleted_text {
            if *expected != splice.removed {
                return Err(CommandError::precondition(format!(
                    "buffer no longer holds the deleted text at {}",
                    self.start
                )));
            }
        }

        context.apply(splice.content.clone(), self.start)?;
        self.deleted_text = Some(splice.removed);
        Ok(splice.content)
    }

    fn restore(&self, context: &mut dyn EditorContext) -> Result<String, CommandError> {
        let deleted = self
            .deleted_text
            .as_deref()
            .ok_or_else(|| CommandError::precondition("delete has not been executed"))?;

        let current = context.content();
        let splice = text::splice(current, self.start, 0, deleted).ok_or_else(|| {
            CommandError::precondition(format!(
                "restore position {} is past the end of the buffer ({} characters)",
                self.start,
                text::len(current)
            ))
        })?;

        context.apply(splice.content.clone(), self.start + text::len(deleted))?;
        Ok(splice.content)
    }
}

impl Command for DeleteText {
    fn execute(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        self.delete(context).into()
    }

    fn undo(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        self.restore(context).into()
    }
}
