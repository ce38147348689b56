use serde::{Deserialize, Serialize};

use super::{Command, CommandResult};
use crate::context::EditorContext;
use crate::error::CommandError;
use crate::text;

/// Replaces `length` characters at `start` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceText {
    start: usize,
    length: usize,
    new_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_text: Option<String>,
}

impl ReplaceText {
    pub fn new(start: usize, length: usize, new_text: impl Into<String>) -> Self {
        ReplaceText {
            start,
            length,
            new_text: new_text.into(),
            original_text: None,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn new_text(&self) -> &str {
        &self.new_text
    }

    pub fn original_text(&self) -> Option<&str> {
        self.original_text.as_deref()
    }

    fn end(&self) -> Option<usize> {
        self.start.checked_add(text::len(&self.new_text))
    }

    /// True when `other` replaces the range that starts right after this
    /// replacement's new text.
    pub fn can_merge(&self, other: &Self) -> bool {
        self.original_text.is_some()
            && other.original_text.is_some()
            && self.end() == Some(other.start)
    }

    pub fn merge(&mut self, other: Self) {
        self.length = self.length.saturating_add(other.length);
        self.new_text.push_str(&other.new_text);
        let original = self.original_text.take().unwrap_or_default();
        self.original_text = Some(original + &other.original_text.unwrap_or_default());
    }

    /// Checks a restored replacement: the captured original must span `length`.
    ///
    /// # Errors
    ///
    /// Will return `Err` with the reason if the record cannot be undone and redone
    pub fn validate_restored(&self) -> Result<(), String> {
        match &self.original_text {
            None => Err("originalText is missing".to_string()),
            Some(original) if text::len(original) != self.length => Err(format!(
                "originalText has {} characters but length is {}",
                text::len(original),
                self.length
            )),
            Some(_) => Ok(()),
        }
    }

    fn replace(&mut self, context: &mut dyn EditorContext) -> Result<String, CommandError> {
        let current = context.content();
        let splice =
            text::splice(current, self.start, self.length, &self.new_text).ok_or_else(|| {
                CommandError::precondition(format!(
                    "replace range {}..{} exceeds buffer length {}",
                    self.start,
                    self.start.saturating_add(self.length),
                    text::len(current)
                ))
            })?;

        if let Some(expected) = &self.original_text {
            if *expected != splice.removed {
                return Err(CommandError::precondition(format!(
                    "buffer no longer holds the replaced text at {}",
                    self.start
                )));
            }
        }

        let cursor = self.start + text::len(&self.new_text);
        context.apply(splice.content.clone(), cursor)?;
        self.original_text = Some(splice.removed);
        Ok(splice.content)
    }

    fn restore(&self, context: &mut dyn EditorContext) -> Result<String, CommandError> {
        let original = self
            .original_text
            .as_deref()
            .ok_or_else(|| CommandError::precondition("replace has not been executed"))?;

        let splice = text::splice(
            context.content(),
            self.start,
            text::len(&self.new_text),
            original,
        )
        .filter(|splice| splice.removed == self.new_text)
        .ok_or_else(|| {
            CommandError::precondition(format!(
                "buffer no longer holds the replacement text at {}",
                self.start
            ))
        })?;

        context.apply(splice.content.clone(), self.start + text::len(original))?;
        Ok(splice.content)
    }
}

impl Command for ReplaceText {
    fn execute(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        self.replace(context).into()
    }

    fn undo(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        self.restore(context).into()
    }
}
