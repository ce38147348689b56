//! Reversible editing operations.
//!
//! The set of operations is closed: [`Operation`] lists every variant, and
//! [`EditorCommand`] wraps one with the identity and timestamp the history
//! needs for merging.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::clock::Clock;
use crate::context::EditorContext;
use crate::error::CommandError;

pub mod delete;
pub mod group;
pub mod insert;
pub mod record;
pub mod replace;

pub use delete::DeleteText;
pub use group::CommandGroup;
pub use insert::InsertText;
pub use record::CommandRecord;
pub use replace::ReplaceText;

pub trait Command {
    fn execute(&mut self, context: &mut dyn EditorContext) -> CommandResult;
    fn undo(&mut self, context: &mut dyn EditorContext) -> CommandResult;
}

/// Outcome of running a command forwards or backwards.
///
/// `content` holds the resulting buffer text when the command produced one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct CommandResult {
    pub success: bool,
    pub content: Option<String>,
    pub error: Option<CommandError>,
}

impl CommandResult {
    pub fn ok(content: Option<String>) -> Self {
        CommandResult {
            success: true,
            content,
            error: None,
        }
    }

    pub fn failed(error: CommandError) -> Self {
        CommandResult {
            success: false,
            content: None,
            error: Some(error),
        }
    }

    /// # Errors
    ///
    /// Will return `Err` if the command did not succeed
    pub fn into_result(self) -> Result<Option<String>, CommandError> {
        match self.error {
            Some(error) => Err(error),
            None if self.success => Ok(self.content),
            None => Err(CommandError::OperationFailed("unknown failure".to_string())),
        }
    }
}

impl From<Result<String, CommandError>> for CommandResult {
    fn from(result: Result<String, CommandError>) -> Self {
        match result {
            Ok(content) => CommandResult::ok(Some(content)),
            Err(error) => CommandResult::failed(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    InsertText,
    DeleteText,
    ReplaceText,
    Group,
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandType::InsertText => "InsertText",
            CommandType::DeleteText => "DeleteText",
            CommandType::ReplaceText => "ReplaceText",
            CommandType::Group => "Group",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    InsertText(InsertText),
    DeleteText(DeleteText),
    ReplaceText(ReplaceText),
    Group(CommandGroup),
}

impl Operation {
    pub fn command_type(&self) -> CommandType {
        match self {
            Operation::InsertText(_) => CommandType::InsertText,
            Operation::DeleteText(_) => CommandType::DeleteText,
            Operation::ReplaceText(_) => CommandType::ReplaceText,
            Operation::Group(_) => CommandType::Group,
        }
    }

    /// Positional compatibility only; timing is checked by [`EditorCommand`].
    pub fn can_merge(&self, other: &Operation) -> bool {
        match (self, other) {
            (Operation::InsertText(a), Operation::InsertText(b)) => a.can_merge(b),
            (Operation::DeleteText(a), Operation::DeleteText(b)) => a.can_merge(b),
            (Operation::ReplaceText(a), Operation::ReplaceText(b)) => a.can_merge(b),
            _ => false,
        }
    }

    /// Folds `other` into `self`, handing it back if the two do not fit together.
    ///
    /// # Errors
    ///
    /// Will return `Err(other)` if [`can_merge`](Self::can_merge) is false
    pub fn merge(&mut self, other: Operation) -> Result<(), Operation> {
        if !self.can_merge(&other) {
            return Err(other);
        }
        match (self, other) {
            (Operation::InsertText(a), Operation::InsertText(b)) => a.merge(b),
            (Operation::DeleteText(a), Operation::DeleteText(b)) => a.merge(b),
            (Operation::ReplaceText(a), Operation::ReplaceText(b)) => a.merge(b),
            (_, other) => return Err(other),
        }
        Ok(())
    }

    /// The persistable form, or `None` for operations that are not replayed
    /// from a flat log.
    pub fn record(&self) -> Option<CommandRecord> {
        match self {
            Operation::InsertText(insert) => Some(CommandRecord::InsertText(insert.clone())),
            Operation::DeleteText(delete) => Some(CommandRecord::DeleteText(delete.clone())),
            Operation::ReplaceText(replace) => Some(CommandRecord::ReplaceText(replace.clone())),
            Operation::Group(_) => None,
        }
    }
}

impl Command for Operation {
    fn execute(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        match self {
            Operation::InsertText(command) => command.execute(context),
            Operation::DeleteText(command) => command.execute(context),
            Operation::ReplaceText(command) => command.execute(context),
            Operation::Group(command) => command.execute(context),
        }
    }

    fn undo(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        match self {
            Operation::InsertText(command) => command.undo(context),
            Operation::DeleteText(command) => command.undo(context),
            Operation::ReplaceText(command) => command.undo(context),
            Operation::Group(command) => command.undo(context),
        }
    }
}

impl From<InsertText> for Operation {
    fn from(command: InsertText) -> Self {
        Operation::InsertText(command)
    }
}

impl From<DeleteText> for Operation {
    fn from(command: DeleteText) -> Self {
        Operation::DeleteText(command)
    }
}

impl From<ReplaceText> for Operation {
    fn from(command: ReplaceText) -> Self {
        Operation::ReplaceText(command)
    }
}

impl From<CommandGroup> for Operation {
    fn from(command: CommandGroup) -> Self {
        Operation::Group(command)
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique command identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(u64);

impl CommandId {
    fn next() -> Self {
        CommandId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An operation stamped with its identity and creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    id: CommandId,
    timestamp: u64,
    operation: Operation,
    /// Set on entries restored from a saved history; nothing merges into them.
    sealed: bool,
}

impl EditorCommand {
    pub fn new(operation: impl Into<Operation>, timestamp: u64) -> Self {
        EditorCommand {
            id: CommandId::next(),
            timestamp,
            operation: operation.into(),
            sealed: false,
        }
    }

    /// Closes this entry to further merging.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn insert_text(clock: &impl Clock, position: usize, text: impl Into<String>) -> Self {
        Self::new(InsertText::new(position, text), clock.now_millis())
    }

    pub fn delete_text(clock: &impl Clock, start: usize, length: usize) -> Self {
        Self::new(DeleteText::new(start, length), clock.now_millis())
    }

    pub fn replace_text(
        clock: &impl Clock,
        start: usize,
        length: usize,
        new_text: impl Into<String>,
    ) -> Self {
        Self::new(ReplaceText::new(start, length, new_text), clock.now_millis())
    }

    pub fn group(clock: &impl Clock, group: CommandGroup) -> Self {
        Self::new(group, clock.now_millis())
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn command_type(&self) -> CommandType {
        self.operation.command_type()
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// True if this entry is not sealed and `other` is the same kind of edit,
    /// positionally adjacent, and created no more than `merge_window_ms`
    /// after this command.
    pub fn can_merge(&self, other: &EditorCommand, merge_window_ms: u64) -> bool {
        !self.sealed
            && other
                .timestamp
                .checked_sub(self.timestamp)
                .is_some_and(|elapsed| elapsed <= merge_window_ms)
            && self.operation.can_merge(&other.operation)
    }

    /// Absorbs `other`, taking over its timestamp so a chain of merges is
    /// measured from the latest edit.
    ///
    /// # Errors
    ///
    /// Will return `Err(other)` unchanged if the operations do not fit together
    pub fn merge(&mut self, other: EditorCommand) -> Result<(), EditorCommand> {
        if self.sealed {
            return Err(other);
        }

        let EditorCommand {
            id,
            timestamp,
            operation,
            sealed,
        } = other;

        match self.operation.merge(operation) {
            Ok(()) => {
                self.timestamp = timestamp;
                Ok(())
            }
            Err(operation) => Err(EditorCommand {
                id,
                timestamp,
                operation,
                sealed,
            }),
        }
    }

    pub fn record(&self) -> Option<CommandRecord> {
        self.operation.record()
    }

    /// The `{type, data}` JSON form, or `None` if this command is not persistable.
    pub fn serialize(&self) -> Option<String> {
        self.record()
            .and_then(|record| serde_json::to_string(&record).ok())
    }
}

impl Command for EditorCommand {
    fn execute(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        self.operation.execute(context)
    }

    fn undo(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        self.operation.undo(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::Buffer;

    #[test]
    fn ids_are_unique() {
        let clock = ManualClock::new(0);
        let a = EditorCommand::insert_text(&clock, 0, "a");
        let b = EditorCommand::insert_text(&clock, 0, "a");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn merge_window_is_inclusive_and_forward_only() {
        let clock = ManualClock::new(1_000);
        let first = EditorCommand::insert_text(&clock, 0, "a");
        clock.advance(500);
        let in_window = EditorCommand::insert_text(&clock, 1, "b");
        clock.advance(1);
        let late = EditorCommand::insert_text(&clock, 1, "b");

        assert!(first.can_merge(&in_window, 500));
        assert!(!first.can_merge(&late, 500));
        assert!(!in_window.can_merge(&first, 500));
    }

    #[test]
    fn merge_refreshes_timestamp() {
        let clock = ManualClock::new(0);
        let mut first = EditorCommand::insert_text(&clock, 0, "a");
        clock.advance(400);
        let second = EditorCommand::insert_text(&clock, 1, "b");
        clock.advance(400);
        let third = EditorCommand::insert_text(&clock, 2, "c");

        first.merge(second).unwrap();
        assert_eq!(first.timestamp(), 400);
        assert!(first.can_merge(&third, 500));
        first.merge(third).unwrap();

        match first.operation() {
            Operation::InsertText(insert) => assert_eq!(insert.text(), "abc"),
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn sealed_entries_refuse_merges() {
        let clock = ManualClock::new(0);
        let mut first = EditorCommand::insert_text(&clock, 0, "a");
        let next = EditorCommand::insert_text(&clock, 1, "b");
        first.seal();

        assert!(first.is_sealed());
        assert!(!first.can_merge(&next, 500));
        assert_eq!(first.merge(next.clone()).unwrap_err(), next);
    }

    #[test]
    fn different_variants_never_merge() {
        let clock = ManualClock::new(0);
        let mut buffer = Buffer::from("abc");
        let mut insert = EditorCommand::insert_text(&clock, 3, "d");
        assert!(insert.execute(&mut buffer).success);
        let mut delete = EditorCommand::delete_text(&clock, 3, 1);
        assert!(delete.execute(&mut buffer).success);

        assert!(!insert.can_merge(&delete, 500));
        let rejected = insert.merge(delete.clone()).unwrap_err();
        assert_eq!(rejected, delete);
    }

    #[test]
    fn groups_are_not_persistable() {
        let clock = ManualClock::new(0);
        let group = EditorCommand::group(&clock, CommandGroup::new());
        assert_eq!(group.command_type(), CommandType::Group);
        assert_eq!(group.serialize(), None);

        let insert = EditorCommand::insert_text(&clock, 0, "hi");
        assert_eq!(
            insert.serialize().as_deref(),
            Some(r#"{"type":"InsertText","data":{"position":0,"text":"hi"}}"#)
        );
    }

    #[test]
    fn into_result_surfaces_errors() {
        let failed = CommandResult::failed(CommandError::NothingToUndo);
        assert_eq!(failed.into_result(), Err(CommandError::NothingToUndo));
        assert_eq!(
            CommandResult::ok(Some("x".to_string())).into_result(),
            Ok(Some("x".to_string()))
        );
    }
}
