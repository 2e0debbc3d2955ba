//! The index run: one bounded pass from the persisted cursor to the chain head.
//!
//! 1. RESOLVE: read `max persisted block` and the chain head.
//! 2. FETCH: query every chunk of `[cursor, head]` through the range indexer.
//! 3. PERSIST: upsert the unioned events in one insert.
//!
//! Nothing is written until every chunk has succeeded, so a failed run leaves
//! the cursor where it was and the next run retries the same range.
//!
//! Store and chain-head reads are bounded by `chunk_timeout_ms`; the whole
//! pass (resolve, fetch, persist) is bounded by `run_deadline_ms`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use podindex_core::chunk::chunk_count;
use podindex_core::cursor::{CursorResolver, ResolvedRange};
use podindex_core::error::IndexerError;
use podindex_core::indexer::{IndexRunState, IndexerConfig};
use podindex_core::range::RangeIndexer;
use podindex_core::source::LogSource;
use podindex_core::store::EventStore;

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// The resolved range; empty when the chain has not advanced.
    pub range: ResolvedRange,
    /// Number of chunk queries planned.
    pub chunks: u64,
    /// Events returned by the log source.
    pub indexed: usize,
    /// Rows newly written to the store.
    pub inserted: usize,
}

impl RunReport {
    /// Returns `true` if the run had nothing to do.
    pub fn is_noop(&self) -> bool {
        self.range.is_empty()
    }
}

/// Composes cursor resolution, range indexing and persistence.
pub struct IndexRun<L, S> {
    config: IndexerConfig,
    resolver: CursorResolver,
    indexer: RangeIndexer<L>,
    store: S,
    state: IndexRunState,
}

impl<L: LogSource, S: EventStore> IndexRun<L, S> {
    /// Fails with `InvalidConfig` if `source` is bound to a contract other
    /// than `config.contract_address`.
    pub fn new(config: IndexerConfig, source: L, store: S) -> Result<Self, IndexerError> {
        if let Some(bound) = source.contract_address() {
            if !bound.eq_ignore_ascii_case(&config.contract_address) {
                return Err(IndexerError::InvalidConfig(format!(
                    "source queries contract {bound}, config names {}",
                    config.contract_address
                )));
            }
        }
        let indexer = RangeIndexer::new(source, &config)?;
        Ok(Self {
            resolver: CursorResolver::new(config.genesis_block)
                .with_read_timeout(Duration::from_millis(config.chunk_timeout_ms)),
            indexer,
            store,
            state: IndexRunState::Idle,
            config,
        })
    }

    pub fn state(&self) -> IndexRunState {
        self.state
    }

    /// The log source the run queries.
    pub fn source(&self) -> &L {
        self.indexer.source()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Run one pass. Errors leave the run in [`IndexRunState::Failed`].
    pub async fn run(&mut self) -> Result<RunReport, IndexerError> {
        let deadline = self.config.run_deadline_ms;
        let outcome = match deadline {
            Some(ms) => tokio::time::timeout(Duration::from_millis(ms), self.run_inner())
                .await
                .unwrap_or(Err(IndexerError::DeadlineExceeded { ms })),
            None => self.run_inner().await,
        };
        match outcome {
            Ok(report) => {
                self.state = IndexRunState::Completed;
                Ok(report)
            }
            Err(e) => {
                self.state = IndexRunState::Failed;
                tracing::error!(error = %e, "Index run failed");
                Err(e)
            }
        }
    }

    async fn run_inner(&mut self) -> Result<RunReport, IndexerError> {
        self.state = IndexRunState::Resolving;
        let range = self.resolver.resolve(&self.store, self.indexer.source()).await?;

        if range.is_empty() {
            tracing::info!(
                starting_block = range.starting_block,
                current_block = range.current_block,
                "Chain has not advanced, nothing to index"
            );
            return Ok(RunReport {
                range,
                chunks: 0,
                indexed: 0,
                inserted: 0,
            });
        }

        let chunks = chunk_count(range.starting_block, range.current_block, self.config.chunk_size)?;

        self.state = IndexRunState::Fetching;
        let events = self
            .indexer
            .index_range(range.starting_block, range.current_block)
            .await?;

        self.state = IndexRunState::Persisting;
        let inserted = if events.is_empty() {
            0
        } else {
            self.store
                .insert(&events)
                .await
                .map_err(|e| IndexerError::InsertFailure {
                    count: events.len(),
                    reason: e.to_string(),
                })?
        };

        tracing::info!(
            from = range.starting_block,
            to = range.current_block,
            chunks,
            indexed = events.len(),
            inserted,
            "Index run complete"
        );

        Ok(RunReport {
            range,
            chunks,
            indexed: events.len(),
            inserted,
        })
    }
}
