//! EVM log fetcher.
//!
//! Adapts an `eth_getLogs`-capable JSON-RPC client into a [`LogSource`] by
//! decoding indexed event arguments out of the log topics.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use podindex_core::error::IndexerError;
use podindex_core::indexer::IndexerConfig;
use podindex_core::source::LogSource;
use podindex_core::types::LogEntry;

/// `keccak256("PodDeployed(address,address)")`.
pub const POD_DEPLOYED_TOPIC0: &str =
    "0x21c99d0db02213c32fff5b05cf0a718ab5f858802b91498f80d82270289d856a";

/// A raw EVM log as returned by `eth_getLogs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    #[serde(rename = "data")]
    pub data: String,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "blockHash")]
    pub block_hash: String,
    #[serde(rename = "transactionHash")]
    pub tx_hash: String,
    #[serde(rename = "logIndex")]
    pub log_index: String,
    #[serde(rename = "removed")]
    pub removed: Option<bool>,
}

impl RawLog {
    /// Returns the block number as u64.
    pub fn block_number_u64(&self) -> Result<u64, IndexerError> {
        parse_hex_u64(&self.block_number)
    }

    /// Returns `true` if this log was removed by a reorg.
    pub fn is_removed(&self) -> bool {
        self.removed.unwrap_or(false)
    }
}

/// Parameters of a single `eth_getLogs` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub address: String,
    pub topic0: String,
    pub from_block: u64,
    pub to_block: u64,
}

/// Trait for fetching EVM data from a JSON-RPC provider.
#[async_trait]
pub trait EvmRpcClient: Send + Sync {
    async fn get_block_number(&self) -> Result<u64, IndexerError>;
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, IndexerError>;
}

#[async_trait]
impl<T: EvmRpcClient + ?Sized> EvmRpcClient for std::sync::Arc<T> {
    async fn get_block_number(&self) -> Result<u64, IndexerError> {
        (**self).get_block_number().await
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, IndexerError> {
        (**self).get_logs(filter).await
    }
}

/// An event whose arguments are all carried in topics (every parameter indexed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventAbi {
    pub name: String,
    pub topic0: String,
    /// Names of the indexed parameters, in declaration order (topics 1..).
    pub indexed: Vec<String>,
}

impl EventAbi {
    /// `PodDeployed(address indexed eigenPod, address indexed podOwner)`.
    pub fn pod_deployed() -> Self {
        Self {
            name: "PodDeployed".into(),
            topic0: POD_DEPLOYED_TOPIC0.into(),
            indexed: vec!["eigenPod".into(), "podOwner".into()],
        }
    }

    /// Decode a raw log into a [`LogEntry`]. Missing topics leave the
    /// corresponding argument absent.
    pub fn decode(&self, log: &RawLog) -> Result<LogEntry, IndexerError> {
        let mut entry = LogEntry::new(log.block_number_u64()?);
        for (name, topic) in self.indexed.iter().zip(log.topics.iter().skip(1)) {
            entry.args.insert(name.clone(), topic_to_address(topic));
        }
        Ok(entry)
    }
}

/// [`LogSource`] over an [`EvmRpcClient`] for one contract.
pub struct EvmLogSource<C> {
    client: C,
    contract_address: String,
    events: HashMap<String, EventAbi>,
}

impl<C: EvmRpcClient> EvmLogSource<C> {
    pub fn new(client: C, contract_address: impl Into<String>) -> Self {
        Self {
            client,
            contract_address: contract_address.into(),
            events: HashMap::new(),
        }
    }

    /// Source for the contract named in `config`. `PodDeployed` is registered
    /// when it is the configured event; other events need [`with_event`](Self::with_event).
    pub fn from_config(client: C, config: &IndexerConfig) -> Self {
        let source = Self::new(client, config.contract_address.clone());
        let pod_deployed = EventAbi::pod_deployed();
        if config.event == pod_deployed.name {
            source.with_event(pod_deployed)
        } else {
            source
        }
    }

    /// Register an event that `query_filter` may be called with.
    pub fn with_event(mut self, abi: EventAbi) -> Self {
        self.events.insert(abi.name.clone(), abi);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C: EvmRpcClient> LogSource for EvmLogSource<C> {
    async fn block_number(&self) -> Result<u64, IndexerError> {
        self.client.get_block_number().await
    }

    async fn query_filter(
        &self,
        event: &str,
        from: u64,
        to: u64,
    ) -> Result<Vec<LogEntry>, IndexerError> {
        let abi = self
            .events
            .get(event)
            .ok_or_else(|| IndexerError::InvalidConfig(format!("unknown event '{event}'")))?;
        let filter = LogFilter {
            address: self.contract_address.clone(),
            topic0: abi.topic0.clone(),
            from_block: from,
            to_block: to,
        };
        let logs = self.client.get_logs(&filter).await?;
        logs.iter()
            .filter(|log| !log.is_removed())
            .filter(|log| {
                log.topics
                    .first()
                    .is_some_and(|t| t.eq_ignore_ascii_case(&abi.topic0))
            })
            .map(|log| abi.decode(log))
            .collect()
    }

    fn contract_address(&self) -> Option<&str> {
        Some(&self.contract_address)
    }
}

/// Parse a hex-encoded string (with or without `0x`) to u64.
pub fn parse_hex_u64(s: &str) -> Result<u64, IndexerError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|e| IndexerError::Rpc(format!("bad hex quantity '{s}': {e}")))
}

/// Format a u64 as a JSON-RPC hex quantity.
pub fn to_hex_quantity(n: u64) -> String {
    format!("{n:#x}")
}

/// Take the low 20 bytes of a 32-byte topic as a `0x` address.
pub fn topic_to_address(topic: &str) -> String {
    let digits = topic.strip_prefix("0x").unwrap_or(topic);
    let start = digits.len().saturating_sub(40);
    format!("0x{}", digits.get(start..).unwrap_or(digits))
}

/// Build the `params` array for an `eth_getLogs` request.
pub fn get_logs_params(filter: &LogFilter) -> Value {
    serde_json::json!([{
        "address": filter.address,
        "topics": [filter.topic0],
        "fromBlock": to_hex_quantity(filter.from_block),
        "toBlock": to_hex_quantity(filter.to_block),
    }])
}

/// Decode the `result` field of an `eth_getLogs` response.
pub fn logs_from_json(result: Value) -> Result<Vec<RawLog>, IndexerError> {
    serde_json::from_value(result).map_err(|e| IndexerError::Rpc(format!("bad eth_getLogs result: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const POD: &str = "0x000000000000000000000000a1b2c3d4e5f6a7b8c9d0a1b2c3d4e5f6a7b8c9d0";
    const OWNER: &str = "0x0000000000000000000000001111111111111111111111111111111111111111";

    fn raw(block: &str, topics: Vec<&str>, removed: Option<bool>) -> RawLog {
        RawLog {
            address: "0x91e677b07f7af907ec9a428aafa9fc14a0d3a338".into(),
            topics: topics.into_iter().map(String::from).collect(),
            data: "0x".into(),
            block_number: block.into(),
            block_hash: "0x0".into(),
            tx_hash: "0x0".into(),
            log_index: "0x0".into(),
            removed,
        }
    }

    struct StaticClient {
        logs: Vec<RawLog>,
        seen: Mutex<Vec<LogFilter>>,
    }

    #[async_trait]
    impl EvmRpcClient for StaticClient {
        async fn get_block_number(&self) -> Result<u64, IndexerError> {
            Ok(105)
        }
        async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, IndexerError> {
            self.seen.lock().unwrap().push(filter.clone());
            Ok(self.logs.clone())
        }
    }

    #[test]
    fn parse_hex_u64_basic() {
        assert_eq!(parse_hex_u64("0x1").unwrap(), 1);
        assert_eq!(parse_hex_u64("0xff").unwrap(), 255);
        assert_eq!(parse_hex_u64("1234").unwrap(), 0x1234);
        assert!(parse_hex_u64("0xzz").is_err());
        assert_eq!(to_hex_quantity(255), "0xff");
    }

    #[test]
    fn topic_address_extraction() {
        assert_eq!(topic_to_address(POD), "0xa1b2c3d4e5f6a7b8c9d0a1b2c3d4e5f6a7b8c9d0");
    }

    #[test]
    fn decode_pod_deployed() {
        let log = raw("0x66", vec![POD_DEPLOYED_TOPIC0, POD, OWNER], None);
        let entry = EventAbi::pod_deployed().decode(&log).unwrap();
        assert_eq!(entry.block_number, 102);
        assert_eq!(entry.get("eigenPod"), Some("0xa1b2c3d4e5f6a7b8c9d0a1b2c3d4e5f6a7b8c9d0"));
        assert_eq!(entry.get("podOwner"), Some("0x1111111111111111111111111111111111111111"));
    }

    #[test]
    fn logs_json_roundtrip_shape() {
        let v = serde_json::json!([{
            "address": "0x91e6",
            "topics": [POD_DEPLOYED_TOPIC0, POD, OWNER],
            "data": "0x",
            "blockNumber": "0x10",
            "blockHash": "0xabc",
            "transactionHash": "0xdef",
            "logIndex": "0x1"
        }]);
        let logs = logs_from_json(v).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].block_number_u64().unwrap(), 16);
        assert!(!logs[0].is_removed());
    }

    #[test]
    fn get_logs_params_hex_encodes_range() {
        let params = get_logs_params(&LogFilter {
            address: "0xabc".into(),
            topic0: POD_DEPLOYED_TOPIC0.into(),
            from_block: 100,
            to_block: 101,
        });
        assert_eq!(params[0]["fromBlock"], "0x64");
        assert_eq!(params[0]["toBlock"], "0x65");
        assert_eq!(params[0]["topics"][0], POD_DEPLOYED_TOPIC0);
    }

    #[tokio::test]
    async fn source_skips_removed_and_foreign_logs() {
        let client = StaticClient {
            logs: vec![
                raw("0x66", vec![POD_DEPLOYED_TOPIC0, POD, OWNER], None),
                raw("0x67", vec![POD_DEPLOYED_TOPIC0, POD, OWNER], Some(true)),
                raw("0x68", vec!["0xdeadbeef", POD, OWNER], None),
            ],
            seen: Mutex::new(vec![]),
        };
        let source = EvmLogSource::new(client, "0x91e6").with_event(EventAbi::pod_deployed());

        let logs = source.query_filter("PodDeployed", 100, 110).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].block_number, 102);

        let seen = source.client().seen.lock().unwrap().clone();
        assert_eq!(seen[0].from_block, 100);
        assert_eq!(seen[0].to_block, 110);
        assert_eq!(seen[0].address, "0x91e6");
    }

    #[tokio::test]
    async fn unknown_event_rejected() {
        let client = StaticClient { logs: vec![], seen: Mutex::new(vec![]) };
        let source = EvmLogSource::new(client, "0x91e6");
        let err = source.query_filter("Nope", 0, 1).await.unwrap_err();
        assert!(matches!(err, IndexerError::InvalidConfig(_)));
    }
}
