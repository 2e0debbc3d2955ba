//! podindex-evm: EVM log adapter and index run.

pub mod builder;
pub mod fetcher;
pub mod index_loop;

pub use builder::IndexerBuilder;
pub use fetcher::{EventAbi, EvmLogSource, EvmRpcClient, LogFilter, RawLog};
pub use index_loop::{IndexRun, RunReport};
