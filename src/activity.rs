//! Activity log: the ordered trail of progress updates for one task.

use chrono::{DateTime, Local};

use crate::stage::StageName;

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub stage: StageName,
    pub message: String,
    pub time: DateTime<Local>,
}

impl LogEntry {
    /// Wall-clock time of day, e.g. `14:03:27`.
    pub fn clock_time(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }

    /// One display line: time, icon and stage, then the message.
    pub fn render(&self) -> String {
        format!(
            "[{}] {} {}: {}",
            self.clock_time(),
            self.stage.icon(),
            self.stage,
            self.message
        )
    }
}

/// Append-only log. Insertion order is display order.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Vec<LogEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        stage: StageName,
        message: impl Into<String>,
        time: DateTime<Local>,
    ) -> &LogEntry {
        self.entries.push(LogEntry {
            stage,
            message: message.into(),
            time,
        });
        &self.entries[self.entries.len() - 1]
    }

    /// Drop every entry. Only done when a new task is submitted.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
