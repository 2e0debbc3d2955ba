//! SQLite storage backend for PodIndex.
//!
//! Persists indexed events to a single SQLite file. The `pods` table has
//! `(block, address)` as its primary key and inserts use `INSERT OR IGNORE`,
//! so replaying an already-indexed range is harmless.
//!
//! # Usage
//! ```rust,no_run
//! use podindex_storage::sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteStorage::open("./pods.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteStorage::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::debug;

use podindex_core::error::IndexerError;
use podindex_core::store::EventStore;
use podindex_core::types::IndexedEvent;

fn storage_err(e: sqlx::Error) -> IndexerError {
    IndexerError::Storage(e.to_string())
}

/// SQLite-backed event storage.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./pods.db"`) or a full
    /// SQLite URL (`"sqlite:./pods.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, IndexerError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url).await.map_err(storage_err)?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Uses a single connection so every query sees the same database.
    pub async fn in_memory() -> Result<Self, IndexerError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(storage_err)?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<(), IndexerError> {
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS pods (
                block       INTEGER NOT NULL,
                address     TEXT    NOT NULL,
                owner       TEXT    NOT NULL,
                inserted_at INTEGER NOT NULL,
                PRIMARY KEY (block, address)
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_pods_owner ON pods (owner);")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(())
    }

    fn event_from_row(row: &SqliteRow) -> IndexedEvent {
        IndexedEvent {
            block: row.get::<i64, _>("block") as u64,
            address: row.get("address"),
            owner: row.get("owner"),
        }
    }

    /// Total number of stored events.
    pub async fn event_count(&self) -> Result<u64, IndexerError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM pods")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;

        let cnt: i64 = row.get("cnt");
        Ok(cnt as u64)
    }

    /// Events deployed for `owner` (case-insensitive), ordered by block.
    pub async fn events_by_owner(&self, owner: &str) -> Result<Vec<IndexedEvent>, IndexerError> {
        let rows = sqlx::query(
            "SELECT block, address, owner FROM pods
             WHERE owner = ? COLLATE NOCASE ORDER BY block, address",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(rows.iter().map(Self::event_from_row).collect())
    }

    /// Events with `from <= block <= to`, ordered by `(block, address)`.
    pub async fn events_in_range(&self, from: u64, to: u64) -> Result<Vec<IndexedEvent>, IndexerError> {
        let rows = sqlx::query(
            "SELECT block, address, owner FROM pods
             WHERE block >= ? AND block <= ? ORDER BY block, address",
        )
        .bind(from as i64)
        .bind(to as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(rows.iter().map(Self::event_from_row).collect())
    }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

#[async_trait]
impl EventStore for SqliteStorage {
    async fn max_block(&self) -> Result<Option<u64>, IndexerError> {
        let row = sqlx::query("SELECT block FROM pods ORDER BY block DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(row.map(|r| r.get::<i64, _>("block") as u64))
    }

    async fn insert(&self, events: &[IndexedEvent]) -> Result<usize, IndexerError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await.map_err(storage_err)?;
        let mut inserted = 0u64;

        for ev in events {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO pods (block, address, owner, inserted_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(ev.block as i64)
            .bind(&ev.address)
            .bind(&ev.owner)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(storage_err)?;

        debug!(batch = events.len(), inserted, "events stored");
        Ok(inserted as usize)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
