//! The flat `{type, data}` log format for history.

use serde::{Deserialize, Serialize};

use super::{DeleteText, EditorCommand, InsertText, Operation, ReplaceText};
use crate::clock::Clock;
use crate::error::HistoryError;

/// One persisted history entry.
///
/// Deletes and replacements carry the text they removed, so a restored
/// entry can be undone without being run again first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CommandRecord {
    InsertText(InsertText),
    DeleteText(DeleteText),
    ReplaceText(ReplaceText),
}

impl CommandRecord {
    /// Checks that a record describes an edit that can be undone and redone.
    ///
    /// # Errors
    ///
    /// Will return `Err` with the reason if the captured text contradicts the range
    pub fn validate(&self) -> Result<(), String> {
        match self {
            CommandRecord::InsertText(_) => Ok(()),
            CommandRecord::DeleteText(command) => command.validate_restored(),
            CommandRecord::ReplaceText(command) => command.validate_restored(),
        }
    }

    pub fn into_command(self, timestamp: u64) -> EditorCommand {
        let operation: Operation = match self {
            CommandRecord::InsertText(command) => command.into(),
            CommandRecord::DeleteText(command) => command.into(),
            CommandRecord::ReplaceText(command) => command.into(),
        };
        EditorCommand::new(operation, timestamp)
    }
}

/// Parses a serialized history into commands stamped with the current time.
///
/// # Errors
///
/// Will return `Err` if `json` is not an array of known `{type, data}` records,
/// or if any record's captured text does not match its range
pub fn deserialize_history(
    json: &str,
    clock: &impl Clock,
) -> Result<Vec<EditorCommand>, HistoryError> {
    let records: Vec<CommandRecord> = serde_json::from_str(json)?;
    for (index, record) in records.iter().enumerate() {
        record
            .validate()
            .map_err(|reason| HistoryError::InvalidRecord { index, reason })?;
    }

    let now = clock.now_millis();
    Ok(records
        .into_iter()
        .map(|record| record.into_command(now))
        .collect())
}
