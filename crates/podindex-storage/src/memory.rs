//! In-memory storage backend.
//!
//! Holds indexed events in RAM, keyed by `(block, address)`.
//! Useful for testing and short-lived runs that don't need persistence.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use podindex_core::error::IndexerError;
use podindex_core::store::EventStore;
use podindex_core::types::IndexedEvent;

/// In-memory event storage.
///
/// All data is lost when the process exits.
#[derive(Default)]
pub struct InMemoryStorage {
    events: Mutex<BTreeMap<(u64, String), IndexedEvent>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored events.
    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Events deployed for `owner` (case-insensitive), ordered by block.
    pub fn events_by_owner(&self, owner: &str) -> Vec<IndexedEvent> {
        self.events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.owner.eq_ignore_ascii_case(owner))
            .cloned()
            .collect()
    }

    /// Events with `from <= block <= to`, ordered by `(block, address)`.
    pub fn events_in_range(&self, from: u64, to: u64) -> Vec<IndexedEvent> {
        if from > to {
            return vec![];
        }
        self.events
            .lock()
            .unwrap()
            .range((from, String::new())..)
            .take_while(|((block, _), _)| *block <= to)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

#[async_trait]
impl EventStore for InMemoryStorage {
    async fn max_block(&self) -> Result<Option<u64>, IndexerError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .keys()
            .next_back()
            .map(|(block, _)| *block))
    }

    async fn insert(&self, events: &[IndexedEvent]) -> Result<usize, IndexerError> {
        let mut stored = self.events.lock().unwrap();
        let before = stored.len();
        for ev in events {
            stored
                .entry((ev.block, ev.address.clone()))
                .or_insert_with(|| ev.clone());
        }
        let inserted = stored.len() - before;
        tracing::debug!(batch = events.len(), inserted, "events stored");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(block: u64, address: &str, owner: &str) -> IndexedEvent {
        IndexedEvent {
            block,
            address: address.to_string(),
            owner: owner.to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_query_events() {
        let store = InMemoryStorage::new();
        store
            .insert(&[ev(100, "0xa", "0xAlice"), ev(101, "0xb", "0xbob"), ev(102, "0xc", "0xalice")])
            .await
            .unwrap();

        assert_eq!(store.events_by_owner("0xALICE").len(), 2);
        assert_eq!(store.events_by_owner("0xbob").len(), 1);
        assert_eq!(store.max_block().await.unwrap(), Some(102));
    }

    #[tokio::test]
    async fn duplicate_keys_skipped() {
        let store = InMemoryStorage::new();
        let batch = [ev(100, "0xa", "0xo"), ev(100, "0xa", "0xo"), ev(100, "0xb", "0xo")];
        assert_eq!(store.insert(&batch).await.unwrap(), 2);
        assert_eq!(store.insert(&batch).await.unwrap(), 0);
        assert_eq!(store.event_count(), 2);
    }

    #[tokio::test]
    async fn range_query_is_inclusive() {
        let store = InMemoryStorage::new();
        for i in 100..=105 {
            store.insert(&[ev(i, &format!("0x{i}"), "0xo")]).await.unwrap();
        }
        let mid = store.events_in_range(101, 103);
        assert_eq!(mid.iter().map(|e| e.block).collect::<Vec<_>>(), vec![101, 102, 103]);
        assert!(store.events_in_range(106, 105).is_empty());
    }
}
