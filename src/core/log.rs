//! Campaign log emitter.
//!
//! Appends timestamped, tagged entries to the campaign's in-memory log
//! and simultaneously pushes each one to a live subscriber, if attached.
//! Emission never fails: a push the subscriber cannot take is swallowed
//! and does not affect the in-memory log.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::domain::{LogEntry, LogTag};

/// A live subscriber to campaign log entries.
///
/// One-way and back-pressure-free: the emitter calls `accept` once per
/// entry, in order, and never waits for an acknowledgement.
pub trait LogSink: Send + Sync {
    fn accept(&self, entry: &LogEntry);
}

/// Unbounded channels make a natural transport-facing sink. Entries sent
/// after the receiver is dropped are discarded.
impl LogSink for tokio::sync::mpsc::UnboundedSender<LogEntry> {
    fn accept(&self, entry: &LogEntry) {
        if self.send(entry.clone()).is_err() {
            debug!("live log subscriber gone, entry dropped");
        }
    }
}

/// Collects entries into shared memory. Used by the CLI and tests.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn accept(&self, entry: &LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
    }
}

/// The append-only log owned by a single campaign run.
pub struct CampaignLog {
    entries: Vec<LogEntry>,
    sink: Option<Arc<dyn LogSink>>,
}

impl CampaignLog {
    /// Create a log, optionally attached to a live subscriber.
    pub fn new(sink: Option<Arc<dyn LogSink>>) -> Self {
        Self {
            entries: Vec::new(),
            sink,
        }
    }

    /// Record an entry. Appends to the in-memory log, then pushes the
    /// same entry to the live subscriber before returning.
    pub fn record(&mut self, tag: LogTag, message: impl Into<String>) -> &LogEntry {
        self.push(LogEntry::new(tag, message))
    }

    /// Record an entry carrying a structured payload.
    pub fn record_with(
        &mut self,
        tag: LogTag,
        message: impl Into<String>,
        payload: serde_json::Value,
    ) -> &LogEntry {
        self.push(LogEntry::new(tag, message).with_payload(payload))
    }

    fn push(&mut self, entry: LogEntry) -> &LogEntry {
        debug!(tag = %entry.tag, "{}", entry.message);
        self.entries.push(entry);
        let entry = &self.entries[self.entries.len() - 1];
        if let Some(sink) = &self.sink {
            sink.accept(entry);
        }
        entry
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Consume the log, yielding the accumulated entries.
    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }
}
