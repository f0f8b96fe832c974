//! End-to-End Tests
//!
//! Build an index from raw text, then query it through the public API:
//! - retrieval: intersection, phrase, ranked, and wildcard queries
//! - sharding: multi-shard builds agree with single-partition builds
//! - persistence: reopening, rebuilding, and config files
//! - properties: randomized corpora checked against a brute-force model

#[path = "../common/mod.rs"]
mod common;

mod persistence;
mod properties;
mod retrieval;
mod sharding;
