//! Quarry - disk-backed inverted index
//!
//! Quarry builds an inverted index over a document collection and answers
//! intersection, phrase, and ranked queries against it.
//!
//! # Quick Start
//!
//! ```ignore
//! use quarry::{Indexer, IndexLayout, NormalizationMode, Query, QueryType, QuarryConfig,
//!              RankingMode, Searcher};
//!
//! let mut indexer = Indexer::new(IndexLayout::new("index"), QuarryConfig::default())?;
//! indexer.index_directory("corpus".as_ref())?;
//! let (index, report) = indexer.finish()?;
//!
//! let hits = Searcher::new(&index).search(
//!     &Query::parse("the cat"),
//!     QueryType::Phrase,
//!     RankingMode::TfIdf,
//!     NormalizationMode::Length,
//! )?;
//! ```
//!
//! # Architecture
//!
//! Building runs through the engine: terms accumulate in memory, spill to
//! shard partitions when a ceiling is reached, and shards are merged in pairs
//! by a worker pool until one remains. That shard is installed as the
//! canonical partition. Searching only ever reads the canonical partition.

pub use quarry_core::{
    DocId, Document, Error, PostingsEntry, PostingsList, PostingsSource, Result, ShardId,
};
pub use quarry_engine::{
    BuildReport, DiskIndex, Indexer, QuarryConfig, RankingWeights, ShardedIndexBuilder,
    SimpleTokenizer, Tokenizer, CONFIG_FILE_NAME,
};
pub use quarry_search::{
    AuthorityScores, AuthorityTable, KGramIndex, NoAuthority, NormalizationMode, Query,
    QueryTerm, QueryType, RankingMode, Searcher,
};
pub use quarry_storage::{IndexLayout, Partition};
