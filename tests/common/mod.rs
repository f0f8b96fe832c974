//! Shared test utilities for the end-to-end suites.

#![allow(dead_code)]

use quarry::{DiskIndex, Indexer, IndexLayout, PostingsList, PostingsSource, QuarryConfig};
use std::sync::Once;
use tempfile::TempDir;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness, once per binary
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ============================================================================
// TestIndex - built index plus the directory that owns it
// ============================================================================

/// An index built in a temporary directory
pub struct TestIndex {
    pub index: DiskIndex,
    pub report: quarry::BuildReport,
    pub dir: TempDir,
}

impl TestIndex {
    /// Build `docs` with the given config, naming documents `doc0`, `doc1`, ...
    pub fn build(docs: &[&str], config: QuarryConfig) -> Self {
        init_tracing();
        let dir = TempDir::new().unwrap();
        let mut indexer = Indexer::new(IndexLayout::new(dir.path()), config).unwrap();
        for (i, text) in docs.iter().enumerate() {
            indexer.index_text(&format!("doc{}", i), text).unwrap();
        }
        let (index, report) = indexer.finish().unwrap();
        TestIndex { index, report, dir }
    }

    /// Build with a large ceiling so nothing is spilled
    pub fn single(docs: &[&str]) -> Self {
        Self::build(
            docs,
            QuarryConfig::default()
                .with_table_size(4099)
                .with_max_terms_per_shard(4000),
        )
    }

    /// Build with a tiny ceiling so the corpus is split across many shards
    pub fn sharded(docs: &[&str]) -> Self {
        Self::build(docs, QuarryConfig::for_testing())
    }

    pub fn layout(&self) -> IndexLayout {
        IndexLayout::new(self.dir.path())
    }

    pub fn postings(&self, term: &str) -> Option<PostingsList> {
        self.index.postings(term).unwrap()
    }
}

/// Postings with each document's offsets sorted
///
/// Merging concatenates offsets of a document split across shards, so
/// offset order is only guaranteed when the document was not split.
pub fn normalized(list: &PostingsList) -> Vec<(u32, Vec<u32>)> {
    list.iter()
        .map(|entry| {
            let mut offsets = entry.offsets.clone();
            offsets.sort_unstable();
            (entry.doc_id, offsets)
        })
        .collect()
}
