#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! Command-based undo/redo for ferro's text buffers.
//!
//! Edits are expressed as [`EditorCommand`]s and run through a
//! [`CommandManager`], which records them for undo and redo, coalesces
//! quick consecutive keystrokes into one entry, and can export its history
//! as a flat JSON log.

mod buffer;
pub mod clock;
pub mod commands;
mod config;
mod context;
mod error;
mod manager;
pub mod text;

pub use buffer::Buffer;
pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::record::deserialize_history;
pub use commands::{
    Command, CommandGroup, CommandId, CommandRecord, CommandResult, CommandType, DeleteText,
    EditorCommand, InsertText, Operation, ReplaceText,
};
pub use config::{HistoryConfig, DEFAULT_MAX_HISTORY_SIZE, DEFAULT_MERGE_WINDOW_MS};
pub use context::EditorContext;
pub use error::{ApplyError, CommandError, HistoryError};
pub use manager::{CommandManager, HistoryInfo};
