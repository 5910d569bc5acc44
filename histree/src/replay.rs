//! Append events, and replaying them into a [`HistoryTree`]

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

use crate::{error::Result, hash::Digest, HistoryTree};

/// The number of ledger elements each append event accounts for
///
/// The ledger counts the value and salt of a pair commitment separately, so the running count
/// advances by two per event
pub const ELEMENTS_PER_APPEND: u64 = 2;

/// A single append, as emitted by the ledger
///
/// Deserializes from either this crate's field names or the ledger's own (`firstLevelHash`,
/// `nNodes`). The running count may be a number or a decimal string:
///
/// ```rust
/// # use histree::{hash::Digest, AppendEvent};
/// let digest = Digest::calculate(b"commitment");
/// let json = format!(r#"{{ "firstLevelHash": "{digest}", "nNodes": "4" }}"#);
///
/// let event: AppendEvent = serde_json::from_str(&json).unwrap();
/// assert_eq!(event, AppendEvent::new(digest, 4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendEvent {
    /// The pair commitment that was appended
    #[serde(alias = "firstLevelHash")]
    pub pair_commitment_digest: Digest,

    /// The ledger's element count after this append
    #[serde(alias = "nNodes", deserialize_with = "count::deserialize")]
    pub running_count: u64,
}

impl AppendEvent {
    /// Create a new [`AppendEvent`]
    #[must_use]
    pub fn new(pair_commitment_digest: Digest, running_count: u64) -> Self {
        Self {
            pair_commitment_digest,
            running_count,
        }
    }
}

mod count {
    use serde::{de::Error, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Count::deserialize(deserializer)? {
            Count::Number(n) => Ok(n),
            Count::Text(s) => s.trim().parse().map_err(D::Error::custom),
        }
    }
}

/// The events in `events` that come after `running_count`
///
/// `events` is expected in emission order, as fetched from the ledger
#[must_use]
pub fn events_after(events: &[AppendEvent], running_count: u64) -> &[AppendEvent] {
    events
        .iter()
        .position(|event| event.running_count > running_count)
        .map_or(&[], |start| &events[start..])
}

impl HistoryTree {
    /// Build a tree by replaying `events` from genesis
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`HistoryTree::append`]
    pub fn from_events<I>(events: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Borrow<AppendEvent>,
    {
        let mut tree = Self::new();
        tree.replay(events)?;
        Ok(tree)
    }

    /// Apply `events` in order, returning the root after the last one
    ///
    /// `events` must continue on from the last event applied to this tree. Replay stops at the
    /// first event that fails to apply; every event before it stays applied
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`HistoryTree::append`]
    #[tracing::instrument(skip_all, fields(from = self.running_count()))]
    pub fn replay<I>(&mut self, events: I) -> Result<Digest>
    where
        I: IntoIterator,
        I::Item: Borrow<AppendEvent>,
    {
        let mut applied = 0usize;

        for event in events {
            let event = event.borrow();

            if let Err(error) = self.append(event) {
                tracing::warn!(
                    running_count = event.running_count,
                    digest = %event.pair_commitment_digest,
                    %error,
                    "aborting replay"
                );
                return Err(error);
            }

            tracing::debug!(
                running_count = event.running_count,
                root = %self.root(),
                "applied append event"
            );
            applied += 1;
        }

        tracing::debug!(applied, root = %self.root(), "replay finished");

        Ok(self.root())
    }
}
