// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Append-only event log for post-mortem debugging.
//!
//! Every inbound message, outbound response and lifecycle transition is
//! written as one JSON object per line. Logging is fire-and-forget: a log
//! that cannot be opened or written never affects the protocol stream.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// A single logged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The specific event data.
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Types of logged events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Server started and is waiting for `initialize`.
    Started {
        /// Server version string.
        version: String,
    },
    /// Raw protocol message (incoming or outgoing).
    Message {
        /// Direction of the message ("in" or "out").
        direction: String,
        /// The JSON body.
        message: serde_json::Value,
    },
    /// A completion request was classified.
    Completion {
        /// Zero-based line of the request.
        line: u32,
        /// Trimmed text before the cursor.
        input: String,
        /// Whether a dynamic tag item was produced.
        dynamic: bool,
    },
    /// Completion was requested for a document the server has never seen.
    MissingDocument {
        /// The document URI.
        uri: String,
    },
    /// A message body could not be parsed.
    Malformed {
        /// Parser error text.
        error: String,
    },
    /// `shutdown` request received.
    Shutdown,
    /// `exit` notification received.
    Exit {
        /// The exit code the process will terminate with.
        code: i32,
    },
    /// Input stream reached end of file.
    InputClosed,
    /// A termination signal was received.
    Signal {
        /// Signal name.
        name: String,
    },
}

/// Cloneable handle to the event log file.
#[derive(Clone, Default)]
pub struct EventLog {
    file: Option<Arc<Mutex<File>>>,
}

impl EventLog {
    /// Open (or create) the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log dir: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open event log: {}", path.display()))?;

        Ok(Self {
            file: Some(Arc::new(Mutex::new(file))),
        })
    }

    /// Open the log, falling back to a disabled log on failure.
    #[must_use]
    pub fn open_or_disabled(path: &Path) -> Self {
        match Self::open(path) {
            Ok(log) => log,
            Err(e) => {
                warn!("Event log disabled: {e:#}");
                Self::disabled()
            }
        }
    }

    /// A log that discards everything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { file: None }
    }

    /// Append an event.
    pub fn record(&self, kind: EventKind) {
        let Some(file) = &self.file else { return };

        let event = LogEvent {
            timestamp: Utc::now(),
            kind,
        };

        if let Ok(mut file) = file.lock()
            && let Ok(json) = serde_json::to_string(&event)
        {
            if let Err(e) = writeln!(file, "{json}") {
                warn!("Failed to write event log: {}", e);
            }
            let _ = file.flush();
        }
    }

    /// Record a protocol message body. Bodies that are not JSON are logged
    /// as strings.
    pub fn message(&self, direction: &str, body: &str) {
        if self.file.is_none() {
            return;
        }
        let message = serde_json::from_str(body)
            .unwrap_or_else(|_| serde_json::Value::String(body.to_string()));
        self.record(EventKind::Message {
            direction: direction.to_string(),
            message,
        });
    }

    /// Flush pending writes.
    pub fn flush(&self) {
        if let Some(file) = &self.file
            && let Ok(mut file) = file.lock()
        {
            let _ = file.flush();
        }
    }
}

/// Read every event from a log file, skipping lines that fail to parse.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn read_events(path: &Path) -> Result<Vec<LogEvent>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open event log: {}", path.display()))?;

    let mut events = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if let Ok(event) = serde_json::from_str::<LogEvent>(&line) {
            events.push(event);
        }
    }
    Ok(events)
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Tests use expect/unwrap for clear failure messages"
)]
mod tests {
    use super::*;

    #[test]
    fn test_events_append_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let log = EventLog::open(&path).unwrap();
        log.record(EventKind::Shutdown);
        log.message("in", r#"{"id":1,"method":"shutdown"}"#);
        log.record(EventKind::Exit { code: 0 });

        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, EventKind::Shutdown);
        match &events[1].kind {
            EventKind::Message { direction, message } => {
                assert_eq!(direction, "in");
                assert_eq!(message["method"], "shutdown");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(events[2].kind, EventKind::Exit { code: 0 });
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        EventLog::open(&path).unwrap().record(EventKind::InputClosed);
        EventLog::open(&path).unwrap().record(EventKind::InputClosed);

        assert_eq!(read_events(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_non_json_message_logged_as_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");

        let log = EventLog::open(&path).unwrap();
        log.message("in", "not json");

        let events = read_events(&path).unwrap();
        assert_eq!(
            events[0].kind,
            EventKind::Message {
                direction: "in".to_string(),
                message: serde_json::Value::String("not json".to_string()),
            }
        );
    }

    #[test]
    fn test_disabled_log_is_silent() {
        let log = EventLog::disabled();
        log.record(EventKind::Shutdown);
        log.message("out", "{}");
        log.flush();
    }
}
