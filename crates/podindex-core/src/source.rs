//! The `LogSource` trait: the read side of the chain.

use async_trait::async_trait;

use crate::error::IndexerError;
use crate::types::LogEntry;

/// A read-only source of decoded contract logs.
///
/// Implementations must be `Send + Sync`; the range indexer queries disjoint
/// chunks concurrently through a shared reference.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Current chain head block number.
    async fn block_number(&self) -> Result<u64, IndexerError>;

    /// All logs for `event` emitted in the inclusive range `[from, to]`.
    async fn query_filter(
        &self,
        event: &str,
        from: u64,
        to: u64,
    ) -> Result<Vec<LogEntry>, IndexerError>;

    /// Contract this source is bound to, if it is bound to one.
    fn contract_address(&self) -> Option<&str> {
        None
    }
}

#[async_trait]
impl<T: LogSource + ?Sized> LogSource for std::sync::Arc<T> {
    async fn block_number(&self) -> Result<u64, IndexerError> {
        (**self).block_number().await
    }

    async fn query_filter(
        &self,
        event: &str,
        from: u64,
        to: u64,
    ) -> Result<Vec<LogEntry>, IndexerError> {
        (**self).query_filter(event, from, to).await
    }

    fn contract_address(&self) -> Option<&str> {
        (**self).contract_address()
    }
}
