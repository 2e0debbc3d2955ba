//! Chunk planner: splits an inclusive block range into fixed-size sub-ranges.
//!
//! The planner is pure range math. [`ChunkPlan`] yields chunks lazily;
//! [`range_chunk_map`] is the collecting fan-out point: it calls a handler
//! once per chunk and collects whatever the handler returns.

use crate::error::IndexerError;
use crate::types::BlockRange;

/// Lazy iterator over the chunks of `[start, end]`.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    next: Option<u64>,
    end: u64,
    chunk_size: u64,
}

impl ChunkPlan {
    /// Plan `[start, end]` in chunks of at most `chunk_size` blocks.
    ///
    /// An empty range (`start > end`) yields no chunks.
    pub fn new(start: u64, end: u64, chunk_size: u64) -> Result<Self, IndexerError> {
        if chunk_size == 0 {
            return Err(IndexerError::InvalidConfig("chunk size must be positive".into()));
        }
        Ok(Self {
            next: (start <= end).then_some(start),
            end,
            chunk_size,
        })
    }
}

impl Iterator for ChunkPlan {
    type Item = BlockRange;

    fn next(&mut self) -> Option<BlockRange> {
        let from = self.next?;
        let to = from.saturating_add(self.chunk_size - 1).min(self.end);
        self.next = if to == self.end { None } else { Some(to + 1) };
        Some(BlockRange::new(from, to))
    }
}

/// Number of chunks [`plan_chunks`] would produce, without building them.
pub fn chunk_count(start: u64, end: u64, chunk_size: u64) -> Result<u64, IndexerError> {
    if chunk_size == 0 {
        return Err(IndexerError::InvalidConfig("chunk size must be positive".into()));
    }
    if start > end {
        return Ok(0);
    }
    // saturates only for [0, u64::MAX] in single-block chunks
    Ok(((end - start) / chunk_size).saturating_add(1))
}

/// Split `[start, end]` into contiguous chunks of at most `chunk_size` blocks.
///
/// Returns an empty plan when `start > end`.
pub fn plan_chunks(start: u64, end: u64, chunk_size: u64) -> Result<Vec<BlockRange>, IndexerError> {
    Ok(ChunkPlan::new(start, end, chunk_size)?.collect())
}

/// Invoke `handler(from, to)` once per planned chunk, in order, and collect the results.
pub fn range_chunk_map<T, F>(
    start: u64,
    end: u64,
    chunk_size: u64,
    mut handler: F,
) -> Result<Vec<T>, IndexerError>
where
    F: FnMut(u64, u64) -> T,
{
    Ok(ChunkPlan::new(start, end, chunk_size)?
        .map(|r| handler(r.from, r.to))
        .collect())
}
