//! Fluent builder API for index runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use podindex_evm::IndexerBuilder;
//!
//! let config = IndexerBuilder::new()
//!     .contract_address("0x91E677b07F7AF907ec9a428aafA9fc14a0d3A338")
//!     .genesis_block(17_445_564)
//!     .chunk_size(5_000)
//!     .max_in_flight(8)
//!     .build_config();
//! ```

use podindex_core::error::IndexerError;
use podindex_core::indexer::IndexerConfig;
use podindex_core::retry::RetryConfig;
use podindex_core::source::LogSource;
use podindex_core::store::EventStore;

use crate::fetcher::{EvmLogSource, EvmRpcClient};
use crate::index_loop::IndexRun;

/// Fluent builder for `IndexerConfig`.
#[derive(Default)]
pub struct IndexerBuilder {
    config: IndexerConfig,
}

impl IndexerBuilder {
    pub fn new() -> Self {
        Self {
            config: IndexerConfig::default(),
        }
    }

    /// Start from an existing config (e.g. one loaded from JSON).
    pub fn from_config(config: IndexerConfig) -> Self {
        Self { config }
    }

    /// Set the contract whose logs are indexed.
    pub fn contract_address(mut self, address: impl Into<String>) -> Self {
        self.config.contract_address = address.into();
        self
    }

    /// Set the event name and the two argument names used to build records.
    pub fn event(
        mut self,
        event: impl Into<String>,
        address_arg: impl Into<String>,
        owner_arg: impl Into<String>,
    ) -> Self {
        self.config.event = event.into();
        self.config.address_arg = address_arg.into();
        self.config.owner_arg = owner_arg.into();
        self
    }

    /// Set the block to start from when the store is empty.
    pub fn genesis_block(mut self, block: u64) -> Self {
        self.config.genesis_block = block;
        self
    }

    /// Set the number of blocks per log query.
    pub fn chunk_size(mut self, size: u64) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the maximum number of chunk queries in flight.
    pub fn max_in_flight(mut self, n: usize) -> Self {
        self.config.max_in_flight = n;
        self
    }

    /// Set the per-chunk retry policy.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the per-attempt chunk timeout in milliseconds.
    pub fn chunk_timeout_ms(mut self, ms: u64) -> Self {
        self.config.chunk_timeout_ms = ms;
        self
    }

    /// Set the overall fetch deadline in milliseconds.
    pub fn run_deadline_ms(mut self, ms: u64) -> Self {
        self.config.run_deadline_ms = Some(ms);
        self
    }

    /// Disable the overall fetch deadline.
    pub fn no_run_deadline(mut self) -> Self {
        self.config.run_deadline_ms = None;
        self
    }

    /// Build the `IndexerConfig`.
    pub fn build_config(self) -> IndexerConfig {
        self.config
    }

    /// Build an [`IndexRun`] querying the configured contract through `client`.
    pub fn build_evm<C: EvmRpcClient, S: EventStore>(
        self,
        client: C,
        store: S,
    ) -> Result<IndexRun<EvmLogSource<C>, S>, IndexerError> {
        let source = EvmLogSource::from_config(client, &self.config);
        IndexRun::new(self.config, source, store)
    }

    /// Build an [`IndexRun`] over the given source and store.
    ///
    /// A source bound to a different contract than the configured one is
    /// rejected with `InvalidConfig`.
    pub fn build<L: LogSource, S: EventStore>(
        self,
        source: L,
        store: S,
    ) -> Result<IndexRun<L, S>, IndexerError> {
        IndexRun::new(self.config, source, store)
    }
}
