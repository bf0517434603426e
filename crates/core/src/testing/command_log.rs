//! Shared command recording for mock devices.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

/// One recorded hardware command.
#[derive(Debug, Clone)]
pub struct CommandEntry {
    /// Device the command was issued to.
    pub device: String,
    /// The command, with arguments rendered into the string.
    pub command: String,
    /// When the command was recorded.
    pub at: DateTime<Utc>,
}

/// Chronological log of every command the mocks received.
///
/// Cloning shares the underlying log, so one log can be handed to several
/// mocks and queried afterwards to assert on command ordering across
/// devices.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    entries: Arc<Mutex<Vec<CommandEntry>>>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, device: &str, command: impl Into<String>) {
        self.entries.lock().unwrap().push(CommandEntry {
            device: device.to_string(),
            command: command.into(),
            at: Utc::now(),
        });
    }

    /// All entries in the order they were recorded.
    pub fn entries(&self) -> Vec<CommandEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Commands recorded for one device, in order.
    pub fn commands_for(&self, device: &str) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.device == device)
            .map(|e| e.command.clone())
            .collect()
    }
}
