// ── Audit event log ──
//
// Fixed-capacity FIFO of human-readable entries. Timestamps come from the
// monotonic clock; consumers only ever see ages relative to "now".

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::time::Instant;

use crate::model::snapshot::millis_since;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: Instant,
    pub level: LogLevel,
    pub message: String,
}

/// A log entry rendered against a reference instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub age_ms: u64,
    /// Compact age label: `12s`, `3m`, `2h`, `1d`.
    pub age: String,
    pub level: LogLevel,
    pub message: String,
}

/// Bounded audit log. Once full, every append discards the oldest entry.
#[derive(Debug)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, level: LogLevel, message: impl Into<String>, at: Instant) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            at,
            level,
            message: message.into(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>, at: Instant) {
        self.append(LogLevel::Info, message, at);
    }

    pub fn warning(&mut self, message: impl Into<String>, at: Instant) {
        self.append(LogLevel::Warning, message, at);
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn records(&self, now: Instant) -> Vec<LogRecord> {
        self.entries
            .iter()
            .map(|e| {
                let age = now.saturating_duration_since(e.at);
                LogRecord {
                    age_ms: millis_since(e.at, now),
                    age: age_label(age),
                    level: e.level,
                    message: e.message.clone(),
                }
            })
            .collect()
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

/// Render an age using the largest whole unit.
pub fn age_label(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        0..60 => format!("{secs}s"),
        60..3600 => format!("{}m", secs / 60),
        3600..86_400 => format!("{}h", secs / 3600),
        _ => format!("{}d", secs / 86_400),
    }
}
