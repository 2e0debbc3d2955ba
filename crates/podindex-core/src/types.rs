//! Shared types for the indexing pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ─── IndexedEvent ─────────────────────────────────────────────────────────────

/// One indexed `PodDeployed` event.
///
/// `(block, address)` is the natural key; stores must treat inserts of an
/// already-present key as no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexedEvent {
    /// Block the event was emitted in.
    pub block: u64,
    /// Address of the deployed pod.
    pub address: String,
    /// Owner of the deployed pod.
    pub owner: String,
}

impl IndexedEvent {
    /// The `(block, address)` identity used for deduplication.
    pub fn key(&self) -> (u64, &str) {
        (self.block, self.address.as_str())
    }
}

// ─── BlockRange ───────────────────────────────────────────────────────────────

/// An inclusive block range `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    pub from: u64,
    pub to: u64,
}

impl BlockRange {
    pub fn new(from: u64, to: u64) -> Self {
        Self { from, to }
    }

    /// Returns `true` if the range contains no blocks (`from > to`).
    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }

    /// Number of blocks in the range.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.to - self.from + 1
        }
    }
}

impl std::fmt::Display for BlockRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

// ─── LogEntry ─────────────────────────────────────────────────────────────────

/// A decoded log as returned by a [`LogSource`](crate::source::LogSource).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Block the log was emitted in.
    pub block_number: u64,
    /// Decoded event arguments, keyed by argument name.
    pub args: BTreeMap<String, String>,
}

impl LogEntry {
    pub fn new(block_number: u64) -> Self {
        Self {
            block_number,
            args: BTreeMap::new(),
        }
    }

    /// Attach a named argument.
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Look up a named argument.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_range_len() {
        assert_eq!(BlockRange::new(100, 101).len(), 2);
        assert_eq!(BlockRange::new(5, 5).len(), 1);
        assert!(BlockRange::new(6, 5).is_empty());
        assert_eq!(BlockRange::new(6, 5).len(), 0);
    }

    #[test]
    fn log_entry_args() {
        let log = LogEntry::new(7).arg("eigenPod", "0xpod").arg("podOwner", "0xowner");
        assert_eq!(log.get("eigenPod"), Some("0xpod"));
        assert_eq!(log.get("missing"), None);
    }

    #[test]
    fn event_key() {
        let ev = IndexedEvent {
            block: 42,
            address: "0xpod".into(),
            owner: "0xowner".into(),
        };
        assert_eq!(ev.key(), (42, "0xpod"));
    }
}
