//! Range indexer: fetches one block range as a set of bounded, concurrent
//! chunk queries and unions the results.
//!
//! Every chunk is queried through the [`LogSource`] with a per-attempt timeout
//! and exponential backoff on transient errors. At most `max_in_flight`
//! chunks are outstanding at any time. The run is all-or-nothing: if any
//! chunk exhausts its retries, the whole range fails and nothing is returned.

use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::chunk::{chunk_count, ChunkPlan};
use crate::error::IndexerError;
use crate::indexer::IndexerConfig;
use crate::retry::RetryPolicy;
use crate::source::LogSource;
use crate::types::{BlockRange, IndexedEvent, LogEntry};

/// Chunked, bounded-concurrency event fetcher over a [`LogSource`].
pub struct RangeIndexer<L> {
    source: L,
    event: String,
    address_arg: String,
    owner_arg: String,
    chunk_size: u64,
    max_in_flight: usize,
    retry: RetryPolicy,
    chunk_timeout: Duration,
    run_deadline: Option<Duration>,
}

impl<L: LogSource> RangeIndexer<L> {
    pub fn new(source: L, config: &IndexerConfig) -> Result<Self, IndexerError> {
        config.validate()?;
        Ok(Self {
            source,
            event: config.event.clone(),
            address_arg: config.address_arg.clone(),
            owner_arg: config.owner_arg.clone(),
            chunk_size: config.chunk_size,
            max_in_flight: config.max_in_flight,
            retry: RetryPolicy::new(config.retry.clone()),
            chunk_timeout: Duration::from_millis(config.chunk_timeout_ms),
            run_deadline: config.run_deadline_ms.map(Duration::from_millis),
        })
    }

    /// The underlying log source.
    pub fn source(&self) -> &L {
        &self.source
    }

    /// Fetch every event in `[starting_block, current_block]`.
    ///
    /// The returned order is unspecified; consumers key on `(block, address)`.
    pub async fn index_range(
        &self,
        starting_block: u64,
        current_block: u64,
    ) -> Result<Vec<IndexedEvent>, IndexerError> {
        let plan = ChunkPlan::new(starting_block, current_block, self.chunk_size)?;
        let chunks = chunk_count(starting_block, current_block, self.chunk_size)?;
        if chunks == 0 {
            return Ok(vec![]);
        }

        info!(
            from = starting_block,
            to = current_block,
            chunks,
            max_in_flight = self.max_in_flight,
            "Indexing range"
        );

        // chunk futures are created as buffer_unordered pulls them
        let all = stream::iter(plan.map(|range| self.fetch_chunk(range)))
            .buffer_unordered(self.max_in_flight)
            .try_collect::<Vec<Vec<IndexedEvent>>>();

        let batches = match self.run_deadline {
            Some(deadline) => tokio::time::timeout(deadline, all)
                .await
                .map_err(|_| IndexerError::DeadlineExceeded {
                    ms: deadline.as_millis() as u64,
                })??,
            None => all.await?,
        };

        let events: Vec<IndexedEvent> = batches.into_iter().flatten().collect();
        info!(
            from = starting_block,
            to = current_block,
            events = events.len(),
            "Range indexed"
        );
        Ok(events)
    }

    async fn fetch_chunk(&self, range: BlockRange) -> Result<Vec<IndexedEvent>, IndexerError> {
        let mut attempt = 0;
        let logs = loop {
            match self.query_once(range).await {
                Ok(logs) => break logs,
                Err(e) if e.is_retryable() => {
                    attempt += 1;
                    match self.retry.next_delay(attempt) {
                        Some(delay) => {
                            warn!(
                                %range,
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                error = %e,
                                "Chunk query failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            return Err(IndexerError::RangeQueryFailure {
                                from: range.from,
                                to: range.to,
                                reason: e.to_string(),
                            })
                        }
                    }
                }
                Err(e) => {
                    return Err(IndexerError::RangeQueryFailure {
                        from: range.from,
                        to: range.to,
                        reason: e.to_string(),
                    })
                }
            }
        };

        debug!(%range, logs = logs.len(), "Chunk fetched");
        logs.iter().map(|log| self.to_event(log)).collect()
    }

    async fn query_once(&self, range: BlockRange) -> Result<Vec<LogEntry>, IndexerError> {
        tokio::time::timeout(
            self.chunk_timeout,
            self.source.query_filter(&self.event, range.from, range.to),
        )
        .await
        .map_err(|_| IndexerError::Timeout {
            ms: self.chunk_timeout.as_millis() as u64,
        })?
    }

    fn to_event(&self, log: &LogEntry) -> Result<IndexedEvent, IndexerError> {
        let arg = |name: &str| {
            log.get(name)
                .map(str::to_string)
                .ok_or_else(|| IndexerError::MalformedLog {
                    block_number: log.block_number,
                    arg: name.to_string(),
                })
        };
        Ok(IndexedEvent {
            block: log.block_number,
            address: arg(&self.address_arg)?,
            owner: arg(&self.owner_arg)?,
        })
    }
}
