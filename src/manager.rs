//! The undo/redo history.

use bounded_vec_deque::BoundedVecDeque;
use serde::Serialize;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::commands::record::{deserialize_history, CommandRecord};
use crate::commands::{Command, CommandGroup, CommandResult, EditorCommand};
use crate::config::HistoryConfig;
use crate::context::EditorContext;
use crate::error::{CommandError, HistoryError};

/// Counts reported by [`CommandManager::history_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryInfo {
    pub undo_count: usize,
    pub redo_count: usize,
    pub max_size: usize,
}

/// Runs commands against an editor and keeps them for undo and redo.
///
/// One manager belongs to one editing surface. Calls are expected to come
/// from a single caller, one at a time.
#[derive(Debug)]
pub struct CommandManager<C: Clock = SystemClock> {
    /// Commands that can be undone (most recent last)
    undo_stack: BoundedVecDeque<EditorCommand>,
    /// Commands that can be redone (most recent last)
    redo_stack: Vec<EditorCommand>,
    config: HistoryConfig,
    clock: C,
}

impl Default for CommandManager<SystemClock> {
    fn default() -> Self {
        Self::from_parts(HistoryConfig::default(), SystemClock::new())
    }
}

impl CommandManager<SystemClock> {
    /// # Errors
    ///
    /// Will return `Err` if `config` is invalid
    pub fn new(config: HistoryConfig) -> Result<Self, HistoryError> {
        Self::with_clock(config, SystemClock::new())
    }
}

impl<C: Clock> CommandManager<C> {
    /// # Errors
    ///
    /// Will return `Err` if `config` is invalid
    pub fn with_clock(config: HistoryConfig, clock: C) -> Result<Self, HistoryError> {
        config.validate()?;
        Ok(Self::from_parts(config, clock))
    }

    fn from_parts(config: HistoryConfig, clock: C) -> Self {
        CommandManager {
            undo_stack: BoundedVecDeque::new(config.max_history_size),
            redo_stack: Vec::new(),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn insert_text(&self, position: usize, text: impl Into<String>) -> EditorCommand {
        EditorCommand::insert_text(&self.clock, position, text)
    }

    pub fn delete_text(&self, start: usize, length: usize) -> EditorCommand {
        EditorCommand::delete_text(&self.clock, start, length)
    }

    pub fn replace_text(
        &self,
        start: usize,
        length: usize,
        new_text: impl Into<String>,
    ) -> EditorCommand {
        EditorCommand::replace_text(&self.clock, start, length, new_text)
    }

    pub fn group(&self, group: CommandGroup) -> EditorCommand {
        EditorCommand::group(&self.clock, group)
    }

    /// Runs `command` and records it.
    ///
    /// A failed command is returned as-is and leaves both stacks untouched.
    pub fn execute(
        &mut self,
        mut command: EditorCommand,
        context: &mut dyn EditorContext,
    ) -> CommandResult {
        let result = command.execute(context);
        if !result.success {
            debug!(id = %command.id(), kind = %command.command_type(), error = ?result.error, "command failed");
            return result;
        }

        debug!(id = %command.id(), kind = %command.command_type(), "command executed");
        self.redo_stack.clear();
        self.push_undo(command);
        result
    }

    fn push_undo(&mut self, command: EditorCommand) {
        let merge_window_ms = self.config.merge_window_ms;
        let command = match self.undo_stack.back_mut() {
            Some(top) if top.can_merge(&command, merge_window_ms) => match top.merge(command) {
                Ok(()) => {
                    debug!(id = %top.id(), "merged command into history top");
                    return;
                }
                Err(command) => command,
            },
            _ => command,
        };

        if let Some(evicted) = self.undo_stack.push_back(command) {
            debug!(id = %evicted.id(), "evicted oldest history entry");
        }
    }

    /// Reverts the most recent command.
    ///
    /// On failure the command stays on the undo stack.
    pub fn undo(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        let Some(command) = self.undo_stack.back_mut() else {
            return CommandResult::failed(CommandError::NothingToUndo);
        };

        let result = command.undo(context);
        if !result.success {
            debug!(id = %command.id(), error = ?result.error, "undo failed");
            return result;
        }

        if let Some(command) = self.undo_stack.pop_back() {
            debug!(id = %command.id(), "undid command");
            self.redo_stack.push(command);
        }
        result
    }

    /// Re-applies the most recently undone command.
    ///
    /// On failure the command stays on the redo stack.
    pub fn redo(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        let Some(command) = self.redo_stack.last_mut() else {
            return CommandResult::failed(CommandError::NothingToRedo);
        };

        let result = command.execute(context);
        if !result.success {
            debug!(id = %command.id(), error = ?result.error, "redo failed");
            return result;
        }

        if let Some(command) = self.redo_stack.pop() {
            debug!(id = %command.id(), "redid command");
            if let Some(evicted) = self.undo_stack.push_back(command) {
                debug!(id = %evicted.id(), "evicted oldest history entry");
            }
        }
        result
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn history_info(&self) -> HistoryInfo {
        HistoryInfo {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            max_size: self.config.max_history_size,
        }
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// The undo stack, oldest first.
    pub fn history(&self) -> Vec<&EditorCommand> {
        self.undo_stack.iter().collect()
    }

    /// Serializes the undo stack as a JSON array of `{type, data}` records.
    ///
    /// Commands that are not persistable are left out.
    ///
    /// # Errors
    ///
    /// Will return `Err` if JSON encoding fails
    pub fn serialize_history(&self) -> Result<String, HistoryError> {
        let records: Vec<CommandRecord> =
            self.undo_stack.iter().filter_map(EditorCommand::record).collect();
        Ok(serde_json::to_string(&records)?)
    }

    /// Replaces the undo stack with `commands`, keeping only the most recent
    /// entries that fit. The redo stack is always cleared.
    ///
    /// Restored entries are sealed, so new typing starts a fresh entry.
    pub fn restore_history(&mut self, commands: impl IntoIterator<Item = EditorCommand>) {
        self.undo_stack = BoundedVecDeque::new(self.config.max_history_size);
        self.redo_stack.clear();

        let mut dropped = 0usize;
        for mut command in commands {
            command.seal();
            if self.undo_stack.push_back(command).is_some() {
                dropped += 1;
            }
        }
        debug!(
            restored = self.undo_stack.len(),
            dropped, "restored history"
        );
    }

    /// Parses `json` and restores it with [`restore_history`](Self::restore_history).
    ///
    /// # Errors
    ///
    /// Will return `Err` if `json` is not a valid serialized history; the
    /// current history is kept in that case
    pub fn restore_serialized(&mut self, json: &str) -> Result<(), HistoryError> {
        let commands = deserialize_history(json, &self.clock)?;
        self.restore_history(commands);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use tracing_test::traced_test;

    use super::*;
    use crate::clock::ManualClock;
    use crate::commands::InsertText;
    use crate::Buffer;

    fn manager_with(max_history_size: usize) -> (CommandManager<Rc<ManualClock>>, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new(0));
        let config = HistoryConfig {
            max_history_size,
            ..HistoryConfig::default()
        };
        let manager = CommandManager::with_clock(config, Rc::clone(&clock)).unwrap();
        (manager, clock)
    }

    #[test]
    fn empty_stacks_report_errors() {
        let (mut manager, _) = manager_with(10);
        let mut buffer = Buffer::from("");

        let undo = manager.undo(&mut buffer);
        assert!(!undo.success);
        assert_eq!(undo.error, Some(CommandError::NothingToUndo));

        let redo = manager.redo(&mut buffer);
        assert_eq!(redo.error, Some(CommandError::NothingToRedo));
    }

    #[test]
    fn zero_history_size_is_rejected() {
        let config = HistoryConfig {
            max_history_size: 0,
            ..HistoryConfig::default()
        };
        assert!(CommandManager::new(config).is_err());
    }

    #[test]
    fn failed_undo_keeps_command() {
        let (mut manager, _) = manager_with(10);
        let mut buffer = Buffer::from("abc");
        let command = manager.insert_text(3, "d");
        assert!(manager.execute(command, &mut buffer).success);

        buffer.set_read_only(true);
        let result = manager.undo(&mut buffer);
        assert!(matches!(
            result.error,
            Some(CommandError::OperationFailed(_))
        ));
        assert_eq!(manager.history_info().undo_count, 1);
        assert_eq!(manager.history_info().redo_count, 0);

        buffer.set_read_only(false);
        assert!(manager.undo(&mut buffer).success);
        assert_eq!(buffer.content(), "abc");
    }

    #[test]
    fn failed_redo_keeps_command() {
        let (mut manager, _) = manager_with(10);
        let mut buffer = Buffer::from("abc");
        let command = manager.delete_text(0, 1);
        assert!(manager.execute(command, &mut buffer).success);
        assert!(manager.undo(&mut buffer).success);

        let mut elsewhere = Buffer::from("");
        assert!(!manager.redo(&mut elsewhere).success);
        assert!(manager.can_redo());
        assert!(!manager.can_undo());
    }

    #[test]
    fn groups_are_dropped_from_serialized_history() {
        let (mut manager, _) = manager_with(10);
        let mut buffer = Buffer::from("");

        let insert = manager.insert_text(0, "a");
        assert!(manager.execute(insert, &mut buffer).success);

        let mut group = CommandGroup::new();
        group.add(InsertText::new(0, "b"));
        let group = manager.group(group);
        assert!(manager.execute(group, &mut buffer).success);

        assert_eq!(manager.history_info().undo_count, 2);
        let json = manager.serialize_history().unwrap();
        assert_eq!(
            json,
            r#"[{"type":"InsertText","data":{"position":0,"text":"a"}}]"#
        );
    }

    #[test]
    fn restore_keeps_most_recent_entries() {
        let (mut manager, clock) = manager_with(3);
        let commands: Vec<EditorCommand> = (0..5)
            .map(|i| EditorCommand::insert_text(&clock, i * 10, i.to_string()))
            .collect();
        let expected: Vec<_> = commands[2..].iter().map(EditorCommand::id).collect();

        manager.restore_history(commands);
        let kept: Vec<_> = manager.history().into_iter().map(EditorCommand::id).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn invalid_restore_keeps_current_history() {
        let (mut manager, _) = manager_with(10);
        let mut buffer = Buffer::from("");
        let insert = manager.insert_text(0, "a");
        assert!(manager.execute(insert, &mut buffer).success);

        assert!(manager.restore_serialized("not json").is_err());
        assert_eq!(manager.history_info().undo_count, 1);
    }

    #[test]
    fn typing_after_restore_starts_a_new_entry() {
        let (mut manager, _) = manager_with(10);
        manager
            .restore_serialized(r#"[{"type":"InsertText","data":{"position":0,"text":"a"}}]"#)
            .unwrap();
        let mut buffer = Buffer::from("a");

        let next = manager.insert_text(1, "b");
        assert!(manager.execute(next, &mut buffer).success);
        assert_eq!(manager.history_info().undo_count, 2);

        assert!(manager.undo(&mut buffer).success);
        assert_eq!(buffer.content(), "a");
    }

    #[test]
    fn restored_insert_at_usize_max_does_not_panic() {
        let (mut manager, _) = manager_with(10);
        let json = format!(
            r#"[{{"type":"InsertText","data":{{"position":{},"text":"a"}}}}]"#,
            usize::MAX
        );
        manager.restore_serialized(&json).unwrap();

        let mut buffer = Buffer::from("");
        let next = manager.insert_text(0, "z");
        assert!(manager.execute(next, &mut buffer).success);
        assert_eq!(manager.history_info().undo_count, 2);
    }

    #[test]
    fn inconsistent_record_keeps_current_history() {
        let (mut manager, _) = manager_with(10);
        let mut buffer = Buffer::from("");
        let insert = manager.insert_text(0, "a");
        assert!(manager.execute(insert, &mut buffer).success);
        assert!(manager.undo(&mut buffer).success);

        let json = r#"[{"type":"DeleteText","data":{"start":0,"length":1,"deletedText":"xyz"}}]"#;
        assert!(matches!(
            manager.restore_serialized(json),
            Err(HistoryError::InvalidRecord { index: 0, .. })
        ));
        assert_eq!(manager.history_info().undo_count, 0);
        assert_eq!(manager.history_info().redo_count, 1);
    }

    #[test]
    fn failed_group_undo_keeps_group_and_buffer() {
        let (mut manager, _) = manager_with(10);
        let mut buffer = Buffer::from("");
        let mut group = CommandGroup::new();
        group.add(InsertText::new(0, "a"));
        group.add(InsertText::new(1, "b"));
        let group = manager.group(group);
        assert!(manager.execute(group, &mut buffer).success);

        let mut drifted = Buffer::from("xb");
        let result = manager.undo(&mut drifted);
        assert!(matches!(
            result.error,
            Some(CommandError::PreconditionFailed(_))
        ));
        assert_eq!(drifted.content(), "xb");
        assert_eq!(manager.history_info().undo_count, 1);
        assert!(!manager.can_redo());

        assert!(manager.undo(&mut buffer).success);
        assert_eq!(buffer.content(), "");
    }

    #[test]
    #[traced_test]
    fn eviction_is_logged() {
        let (mut manager, clock) = manager_with(1);
        let mut buffer = Buffer::from("");

        let first = manager.insert_text(0, "a");
        assert!(manager.execute(first, &mut buffer).success);
        clock.advance(1_000);
        let second = manager.insert_text(1, "b");
        assert!(manager.execute(second, &mut buffer).success);

        assert_eq!(manager.history_info().undo_count, 1);
        assert!(logs_contain("evicted oldest history entry"));
    }

    #[test]
    fn history_info_serializes_camel_case() {
        let (manager, _) = manager_with(7);
        let json = serde_json::to_string(&manager.history_info()).unwrap();
        assert_eq!(json, r#"{"undoCount":0,"redoCount":0,"maxSize":7}"#);
    }
}
