//! podindex-core: foundation for resumable, chunked event indexing.
//!
//! # Architecture
//!
//! ```text
//! CursorResolver  (max persisted block + 1, or genesis; chain head)
//!       │
//!       ▼
//! plan_chunks     ([from, to] sub-ranges of at most chunk_size blocks)
//!       │
//!       ▼
//! RangeIndexer    (bounded concurrent LogSource queries, retry + timeout)
//!       │
//!       ▼
//! EventStore      (idempotent upsert keyed by (block, address))
//! ```

pub mod chunk;
pub mod cursor;
pub mod error;
pub mod indexer;
pub mod range;
pub mod retry;
pub mod source;
pub mod store;
pub mod types;

pub use chunk::{chunk_count, plan_chunks, range_chunk_map, ChunkPlan};
pub use cursor::{Cursor, CursorResolver, ResolvedRange};
pub use error::IndexerError;
pub use indexer::{IndexRunState, IndexerConfig};
pub use range::RangeIndexer;
pub use retry::{RetryConfig, RetryPolicy};
pub use source::LogSource;
pub use store::EventStore;
pub use types::{BlockRange, IndexedEvent, LogEntry};
