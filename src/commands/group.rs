use tracing::warn;

use super::{Command, CommandResult, Operation};
use crate::context::EditorContext;

/// Several operations recorded as a single history entry.
///
/// A group is all-or-nothing: when one child fails, the children that
/// already ran are reverted before the failure is returned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandGroup {
    operations: Vec<Operation>,
}

impl CommandGroup {
    pub fn new() -> Self {
        CommandGroup {
            operations: Vec::new(),
        }
    }

    pub fn from_operations(operations: Vec<Operation>) -> Self {
        CommandGroup { operations }
    }

    pub fn add(&mut self, operation: impl Into<Operation>) {
        self.operations.push(operation.into());
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

impl Command for CommandGroup {
    fn execute(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        let mut last = CommandResult::ok(None);
        for index in 0..self.operations.len() {
            let result = self.operations[index].execute(context);
            if !result.success {
                for operation in self.operations[..index].iter_mut().rev() {
                    let rollback = operation.undo(context);
                    if let Some(error) = rollback.error {
                        warn!(%error, "group rollback left the buffer partially edited");
                    }
                }
                return result;
            }
            last = result;
        }
        last
    }

    fn undo(&mut self, context: &mut dyn EditorContext) -> CommandResult {
        let mut last = CommandResult::ok(None);
        for index in (0..self.operations.len()).rev() {
            let result = self.operations[index].undo(context);
            if !result.success {
                for operation in &mut self.operations[index + 1..] {
                    let rollback = operation.execute(context);
                    if let Some(error) = rollback.error {
                        warn!(%error, "group rollback left the buffer partially edited");
                    }
                }
                return result;
            }
            last = result;
        }
        last
    }
}
