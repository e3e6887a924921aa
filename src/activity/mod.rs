use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;
use uuid::Uuid;


/// Default number of entries kept by the dashboard
pub const DEFAULT_CAPACITY: usize = 50;

/// Severity class of an activity entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// One logged, timestamped description of a change or orchestration event
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActivityEntry {
    /// UUIDv7 (time-ordered)
    pub id: Uuid,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Bounded, newest-first activity log.
///
/// Entries are prepended; once the log grows past `capacity` the oldest
/// entries are dropped.
#[derive(Debug)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    /// Prepend an entry stamped with the current time
    pub fn append(&mut self, severity: Severity, message: impl Into<String>) -> ActivityEntry {
        self.append_at(severity, message, Utc::now())
    }

    pub fn append_at(
        &mut self,
        severity: Severity,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> ActivityEntry {
        let entry = ActivityEntry {
            id: Uuid::now_v7(),
            severity,
            message: message.into(),
            timestamp,
        };

        debug!(severity = %entry.severity, message = %entry.message, "Activity");

        self.entries.push_front(entry.clone());
        self.entries.truncate(self.capacity);
        entry
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<ActivityEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&ActivityEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
