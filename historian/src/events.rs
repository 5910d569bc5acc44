//! The append event log, as fetched from the ledger ahead of time

use std::{fs, path::Path};

use histree::{
    events_after,
    hash::Digest,
    ledger::{canonical_root, Ledger},
    AppendEvent,
};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("failed to read event log {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse event log {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("the event log is read-only, commitments must be submitted to the ledger itself")]
    ReadOnly,
}

/// A single entry in the log: either a bare event, or a decoded `TreeUpdated` log entry that
/// carries it under `returnValues`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LogEntry {
    Event(AppendEvent),
    Decoded {
        #[serde(rename = "returnValues")]
        return_values: AppendEvent,
    },
}

impl From<LogEntry> for AppendEvent {
    fn from(entry: LogEntry) -> Self {
        match entry {
            LogEntry::Event(event) => event,
            LogEntry::Decoded { return_values } => return_values,
        }
    }
}

/// A ledger's event history, loaded from a JSON file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<AppendEvent>,
}

impl EventLog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EventLogError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let contents = fs::read_to_string(path).map_err(|source| EventLogError::Read {
            path: display.clone(),
            source,
        })?;

        let events = Self::parse(&contents).map_err(|source| EventLogError::Parse {
            path: display,
            source,
        })?;

        tracing::debug!(path = %path.display(), events = events.events.len(), "loaded event log");

        Ok(events)
    }

    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<LogEntry> = serde_json::from_str(json)?;
        let events = entries.into_iter().map(AppendEvent::from).collect();

        Ok(Self { events })
    }

    pub fn events(&self) -> &[AppendEvent] {
        &self.events
    }
}

impl Ledger for EventLog {
    type Error = EventLogError;

    fn insert(&mut self, _value: Digest, _salt: Digest) -> Result<(), Self::Error> {
        Err(EventLogError::ReadOnly)
    }

    /// The root the ledger held after the last event in the log
    fn root(&self) -> Result<Digest, Self::Error> {
        let digests: Vec<_> = self
            .events
            .iter()
            .map(|event| event.pair_commitment_digest)
            .collect();

        Ok(canonical_root(&digests))
    }

    fn events_since(&self, running_count: u64) -> Result<Vec<AppendEvent>, Self::Error> {
        Ok(events_after(&self.events, running_count).to_vec())
    }
}
