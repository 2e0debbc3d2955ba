//! Indexer configuration and run state types.

use serde::{Deserialize, Serialize};

use crate::error::IndexerError;
use crate::retry::RetryConfig;

/// Configuration for an index run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Address of the contract emitting the indexed event.
    pub contract_address: String,
    /// Event to query (e.g. `"PodDeployed"`).
    pub event: String,
    /// Event argument holding the indexed record's address.
    pub address_arg: String,
    /// Event argument holding the indexed record's owner.
    pub owner_arg: String,
    /// First block to index when the store is empty.
    pub genesis_block: u64,
    /// Number of blocks per `query_filter` call.
    pub chunk_size: u64,
    /// Maximum chunk queries in flight at once.
    pub max_in_flight: usize,
    /// Per-chunk retry policy.
    pub retry: RetryConfig,
    /// Timeout for a single chunk query attempt (milliseconds).
    pub chunk_timeout_ms: u64,
    /// Deadline for the whole range fetch (milliseconds). `None` = no deadline.
    pub run_deadline_ms: Option<u64>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            contract_address: "0x91E677b07F7AF907ec9a428aafA9fc14a0d3A338".into(),
            event: "PodDeployed".into(),
            address_arg: "eigenPod".into(),
            owner_arg: "podOwner".into(),
            genesis_block: 17_445_564,
            chunk_size: 10_000,
            max_in_flight: 4,
            retry: RetryConfig::default(),
            chunk_timeout_ms: 30_000,
            run_deadline_ms: Some(600_000),
        }
    }
}

impl IndexerConfig {
    /// Parse a config from JSON. Missing fields take their default values.
    pub fn from_json(s: &str) -> Result<Self, IndexerError> {
        let config: Self =
            serde_json::from_str(s).map_err(|e| IndexerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make a run impossible.
    pub fn validate(&self) -> Result<(), IndexerError> {
        if self.chunk_size == 0 {
            return Err(IndexerError::InvalidConfig("chunk_size must be positive".into()));
        }
        if self.max_in_flight == 0 {
            return Err(IndexerError::InvalidConfig("max_in_flight must be positive".into()));
        }
        if self.chunk_timeout_ms == 0 {
            return Err(IndexerError::InvalidConfig("chunk_timeout_ms must be positive".into()));
        }
        if self.event.is_empty() || self.address_arg.is_empty() || self.owner_arg.is_empty() {
            return Err(IndexerError::InvalidConfig("event and argument names must be set".into()));
        }
        Ok(())
    }
}

/// Runtime state of an index run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexRunState {
    /// Not yet started.
    Idle,
    /// Reading the persisted cursor and chain head.
    Resolving,
    /// Fetching chunk logs.
    Fetching,
    /// Writing the unioned events to the store.
    Persisting,
    /// Finished successfully.
    Completed,
    /// Encountered an unrecoverable error.
    Failed,
}

impl std::fmt::Display for IndexRunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Resolving => write!(f, "resolving"),
            Self::Fetching => write!(f, "fetching"),
            Self::Persisting => write!(f, "persisting"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = IndexerConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.event, "PodDeployed");
        assert_eq!(cfg.max_in_flight, 4);
    }

    #[test]
    fn json_partial_override() {
        let cfg = IndexerConfig::from_json(r#"{"genesis_block": 100, "chunk_size": 2}"#).unwrap();
        assert_eq!(cfg.genesis_block, 100);
        assert_eq!(cfg.chunk_size, 2);
        assert_eq!(cfg.owner_arg, "podOwner");
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let err = IndexerConfig::from_json(r#"{"chunk_size": 0}"#).unwrap_err();
        assert!(matches!(err, IndexerError::InvalidConfig(_)));
    }

    #[test]
    fn state_display() {
        assert_eq!(IndexRunState::Persisting.to_string(), "persisting");
    }
}
