//! Append-only operational log
//!
//! Long-running jobs (invoicing runs, extension sweeps, sync pushes) leave
//! a trail here in addition to their tracing output. The log is append-only
//! from the domain's point of view; entries are never edited or removed.

use crate::audit::Actor;
use crate::identifiers::LogEntryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// One operational log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogEntryId,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub actor: Actor,
    /// Job or subsystem that produced the entry, e.g. "invoicing"
    pub context: String,
    pub message: String,
}

/// In-memory operational log
#[derive(Debug, Default)]
pub struct OperationalLog {
    entries: Vec<LogEntry>,
}

impl OperationalLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        level: LogLevel,
        actor: Actor,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.entries.push(LogEntry {
            id: LogEntryId::new_v7(),
            timestamp: Utc::now(),
            level,
            actor,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn info(&mut self, actor: Actor, context: impl Into<String>, message: impl Into<String>) {
        self.record(LogLevel::Info, actor, context, message);
    }

    pub fn warning(
        &mut self,
        actor: Actor,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.record(LogLevel::Warning, actor, context, message);
    }

    pub fn error(&mut self, actor: Actor, context: impl Into<String>, message: impl Into<String>) {
        self.record(LogLevel::Error, actor, context, message);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_is_append_only() {
        let mut log = OperationalLog::new();
        log.info(Actor::System, "invoicing", "run started");
        log.error(Actor::System, "invoicing", "bucket 17 failed");

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].level, LogLevel::Info);
        assert_eq!(log.entries()[1].level, LogLevel::Error);
        assert_eq!(log.entries()[1].context, "invoicing");
    }

    #[test]
    fn test_entries_carry_actor() {
        let mut log = OperationalLog::new();
        log.warning(Actor::user("clerk"), "contracts", "cancel rejected");
        assert_eq!(log.entries()[0].actor, Actor::user("clerk"));
    }
}
