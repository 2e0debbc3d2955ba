//! Cursor resolution: where an index run starts and where it stops.
//!
//! The resume point is derived only from what the store already holds:
//! `max persisted block + 1`, or the configured genesis block when the store
//! is empty. A failed store read is a hard error; silently falling back to
//! genesis would replay every event.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::IndexerError;
use crate::source::LogSource;
use crate::store::EventStore;
use crate::types::BlockRange;

/// The indexer's resume position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Last block already persisted, if any.
    pub last_block: Option<u64>,
    /// Block to start from when nothing has been persisted yet.
    pub genesis_block: u64,
}

impl Cursor {
    pub fn new(last_block: Option<u64>, genesis_block: u64) -> Self {
        Self {
            last_block,
            genesis_block,
        }
    }

    /// Returns the next block to process.
    pub fn next_block(&self) -> u64 {
        match self.last_block {
            Some(b) => b.saturating_add(1),
            None => self.genesis_block,
        }
    }
}

/// The bounded range for one run: `[starting_block, current_block]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub starting_block: u64,
    pub current_block: u64,
}

impl ResolvedRange {
    /// Returns `true` if the chain has not advanced past the cursor.
    pub fn is_empty(&self) -> bool {
        self.starting_block > self.current_block
    }

    pub fn as_block_range(&self) -> BlockRange {
        BlockRange::new(self.starting_block, self.current_block)
    }
}

/// Reads the persisted cursor and the chain head.
pub struct CursorResolver {
    genesis_block: u64,
    read_timeout: Option<Duration>,
}

impl CursorResolver {
    pub fn new(genesis_block: u64) -> Self {
        Self {
            genesis_block,
            read_timeout: None,
        }
    }

    /// Bound each store and chain-head read by `limit`.
    pub fn with_read_timeout(mut self, limit: Duration) -> Self {
        self.read_timeout = Some(limit);
        self
    }

    async fn bounded<T, F>(&self, read: F) -> Result<T, IndexerError>
    where
        F: Future<Output = Result<T, IndexerError>>,
    {
        match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| IndexerError::Timeout {
                    ms: limit.as_millis() as u64,
                })?,
            None => read.await,
        }
    }

    /// Load the cursor from the store.
    pub async fn cursor<S: EventStore + ?Sized>(&self, store: &S) -> Result<Cursor, IndexerError> {
        let last_block = self
            .bounded(store.max_block())
            .await
            .map_err(|e| IndexerError::CursorUnavailable(e.to_string()))?;
        Ok(Cursor::new(last_block, self.genesis_block))
    }

    /// Read the chain head from the log source.
    pub async fn head<L: LogSource + ?Sized>(&self, source: &L) -> Result<u64, IndexerError> {
        self.bounded(source.block_number()).await
    }

    /// Resolve the range for the next run.
    pub async fn resolve<S, L>(&self, store: &S, source: &L) -> Result<ResolvedRange, IndexerError>
    where
        S: EventStore + ?Sized,
        L: LogSource + ?Sized,
    {
        let cursor = self.cursor(store).await?;
        let current_block = self.head(source).await?;
        let range = ResolvedRange {
            starting_block: cursor.next_block(),
            current_block,
        };
        tracing::debug!(
            last_block = ?cursor.last_block,
            starting_block = range.starting_block,
            current_block,
            "Resolved cursor"
        );
        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TestStore;
    use crate::types::{IndexedEvent, LogEntry};
    use async_trait::async_trait;

    struct Head(u64);

    #[async_trait]
    impl LogSource for Head {
        async fn block_number(&self) -> Result<u64, IndexerError> {
            Ok(self.0)
        }
        async fn query_filter(&self, _: &str, _: u64, _: u64) -> Result<Vec<LogEntry>, IndexerError> {
            Ok(vec![])
        }
    }

    struct StuckHead;

    #[async_trait]
    impl LogSource for StuckHead {
        async fn block_number(&self) -> Result<u64, IndexerError> {
            std::future::pending().await
        }
        async fn query_filter(&self, _: &str, _: u64, _: u64) -> Result<Vec<LogEntry>, IndexerError> {
            Ok(vec![])
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl EventStore for BrokenStore {
        async fn max_block(&self) -> Result<Option<u64>, IndexerError> {
            Err(IndexerError::Storage("connection refused".into()))
        }
        async fn insert(&self, _: &[IndexedEvent]) -> Result<usize, IndexerError> {
            Ok(0)
        }
    }

    #[test]
    fn cursor_next_block() {
        assert_eq!(Cursor::new(Some(500), 100).next_block(), 501);
        assert_eq!(Cursor::new(None, 100).next_block(), 100);
    }

    #[tokio::test]
    async fn resolves_genesis_on_empty_store() {
        let store = TestStore::default();
        let range = CursorResolver::new(100).resolve(&store, &Head(105)).await.unwrap();
        assert_eq!(range, ResolvedRange { starting_block: 100, current_block: 105 });
    }

    #[tokio::test]
    async fn resumes_after_max_block() {
        let store = TestStore::default();
        store
            .insert(&[IndexedEvent { block: 102, address: "0xa".into(), owner: "0xo".into() }])
            .await
            .unwrap();
        let range = CursorResolver::new(100).resolve(&store, &Head(105)).await.unwrap();
        assert_eq!(range.starting_block, 103);
    }

    #[tokio::test]
    async fn caught_up_range_is_empty() {
        let store = TestStore::default();
        store
            .insert(&[IndexedEvent { block: 105, address: "0xa".into(), owner: "0xo".into() }])
            .await
            .unwrap();
        let range = CursorResolver::new(100).resolve(&store, &Head(105)).await.unwrap();
        assert!(range.is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_cursor_unavailable() {
        let err = CursorResolver::new(100).resolve(&BrokenStore, &Head(105)).await.unwrap_err();
        assert!(matches!(err, IndexerError::CursorUnavailable(_)));
    }

    #[tokio::test]
    async fn stuck_head_read_times_out() {
        let store = TestStore::default();
        let resolver = CursorResolver::new(100).with_read_timeout(Duration::from_millis(20));
        let err = resolver.resolve(&store, &StuckHead).await.unwrap_err();
        assert!(matches!(err, IndexerError::Timeout { ms: 20 }));
    }
}
