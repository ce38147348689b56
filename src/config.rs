use serde::Deserialize;

use crate::error::HistoryError;

pub const DEFAULT_MAX_HISTORY_SIZE: usize = 100;
pub const DEFAULT_MERGE_WINDOW_MS: u64 = 500;

/// Tunables for a [`CommandManager`](crate::CommandManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Most undo entries kept; older ones are evicted first.
    pub max_history_size: usize,
    /// Largest gap between two commands that may still be coalesced.
    pub merge_window_ms: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            max_history_size: DEFAULT_MAX_HISTORY_SIZE,
            merge_window_ms: DEFAULT_MERGE_WINDOW_MS,
        }
    }
}

impl HistoryConfig {
    /// Parses a config object; missing keys fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Will return `Err` if `json` is malformed or the values are invalid
    pub fn from_json(json: &str) -> Result<Self, HistoryError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Will return `Err` if `max_history_size` is zero
    pub fn validate(&self) -> Result<(), HistoryError> {
        if self.max_history_size == 0 {
            return Err(HistoryError::InvalidConfig(
                "maxHistorySize must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
