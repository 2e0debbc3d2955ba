//! Event store trait: the persistence side of an index run.
//!
//! The store holds one row per [`IndexedEvent`], keyed by `(block, address)`.
//! The maximum persisted block is the indexer's resume cursor, so the store
//! is the only place progress is recorded.

use async_trait::async_trait;

use crate::error::IndexerError;
use crate::types::IndexedEvent;

/// Trait for persisting indexed events.
///
/// Implementations: `InMemoryStorage` and `SqliteStorage` in `podindex-storage`.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Highest block number persisted so far (`None` if the store is empty).
    async fn max_block(&self) -> Result<Option<u64>, IndexerError>;

    /// Upsert events; rows whose `(block, address)` already exist are skipped.
    ///
    /// Returns the number of newly inserted rows.
    async fn insert(&self, events: &[IndexedEvent]) -> Result<usize, IndexerError>;
}

#[async_trait]
impl<T: EventStore + ?Sized> EventStore for std::sync::Arc<T> {
    async fn max_block(&self) -> Result<Option<u64>, IndexerError> {
        (**self).max_block().await
    }

    async fn insert(&self, events: &[IndexedEvent]) -> Result<usize, IndexerError> {
        (**self).insert(events).await
    }
}

/// Minimal store for unit tests in this crate; real backends live in
/// `podindex-storage`.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct TestStore {
    rows: std::sync::Mutex<std::collections::BTreeSet<(u64, String)>>,
}

#[cfg(test)]
#[async_trait]
impl EventStore for TestStore {
    async fn max_block(&self) -> Result<Option<u64>, IndexerError> {
        Ok(self.rows.lock().unwrap().iter().next_back().map(|(block, _)| *block))
    }

    async fn insert(&self, events: &[IndexedEvent]) -> Result<usize, IndexerError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(events
            .iter()
            .filter(|ev| rows.insert((ev.block, ev.address.clone())))
            .count())
    }
}
