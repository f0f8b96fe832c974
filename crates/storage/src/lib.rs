//! Storage layer for quarry
//!
//! This crate implements the on-disk representation of an index partition:
//! - DiskDictionary: fixed-slot hash table of 12-byte records, linear probing
//! - DataStore: append-only file of `term<postings` blobs
//! - PartitionIndex: dictionary + data store + in-memory accumulator
//! - IndexLayout: file naming inside an index directory
//! - DocumentStore / DocumentLog: `docInfo` and `norms` metadata
//!
//! Partitions are written once and then only read. A build flushes many
//! shard partitions, merges them pairwise, and installs the last one as the
//! canonical partition.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod data;
pub mod dictionary;
pub mod documents;
pub mod layout;
pub mod partition;

pub use data::{BlobScanner, DataStore};
pub use dictionary::{DictionaryRecord, DiskDictionary, Lookup, RECORD_SIZE};
pub use documents::{DocumentLog, DocumentStore};
pub use layout::{IndexLayout, Partition};
pub use partition::{Accumulator, FlushStats, PartitionIndex};
