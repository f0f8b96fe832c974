//! Index build engine for quarry
//!
//! This crate drives the construction of an on-disk index:
//! - QuarryConfig: `quarry.toml` settings (table size, flush ceiling, workers)
//! - WorkerPool: bounded FIFO thread pool for shard flushes and merges
//! - MergeCoordinator: shard queue, in-flight counters, completion signal
//! - merge_shards: two-way external merge of shard partitions
//! - ShardedIndexBuilder: accumulate → spill → merge → install
//! - Indexer: document ingestion, tokenization, and norm computation
//! - DiskIndex: read-only access to an installed index
//!
//! The engine is the only component that knows about shards; readers only
//! ever see the canonical partition.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod coordinator;
pub mod disk_index;
pub mod indexer;
pub mod merge;
pub mod pool;
pub mod tokenizer;

pub use builder::{BuildReport, ShardedIndexBuilder};
pub use config::{QuarryConfig, RankingWeights, CONFIG_FILE_NAME};
pub use coordinator::{FinalShard, MergeCoordinator, MergeTicket, Stage};
pub use disk_index::DiskIndex;
pub use indexer::Indexer;
pub use merge::{merge_shards, MergeStats};
pub use pool::{Backpressure, PoolSummary, WorkerPool};
pub use tokenizer::{SimpleTokenizer, Tokenizer};
