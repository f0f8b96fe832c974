//! Reopening, rebuilding, and configuration files

use crate::common::*;
use quarry::{DiskIndex, Indexer, IndexLayout, PostingsSource, QuarryConfig, CONFIG_FILE_NAME};
use tempfile::TempDir;

#[test]
fn test_reopen_after_build() {
    let built = TestIndex::sharded(&["alpha beta", "beta gamma delta", "alpha"]);
    let layout = built.layout();
    let TestIndex { index, dir, .. } = built;
    drop(index);

    let reopened = DiskIndex::open(&layout).unwrap();
    assert_eq!(reopened.doc_count(), 3);
    assert_eq!(reopened.doc_path(1), Some("doc1"));
    assert_eq!(reopened.doc_length(1), Some(3));
    assert_eq!(reopened.postings("alpha").unwrap().unwrap().doc_ids(), vec![0, 2]);
    drop(dir);
}

#[test]
fn test_rebuild_replaces_previous_index() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let layout = IndexLayout::new(dir.path());

    let mut first = Indexer::new(layout.clone(), QuarryConfig::for_testing()).unwrap();
    first.index_text("old0", "stale words here").unwrap();
    first.index_text("old1", "more stale words").unwrap();
    drop(first.finish().unwrap());

    let mut second = Indexer::new(layout.clone(), QuarryConfig::for_testing()).unwrap();
    second.index_text("new0", "fresh words").unwrap();
    let (index, _) = second.finish().unwrap();

    assert_eq!(index.doc_count(), 1);
    assert_eq!(index.doc_path(0), Some("new0"));
    assert!(index.postings("stale").unwrap().is_none());
    assert_eq!(index.postings("words").unwrap().unwrap().doc_ids(), vec![0]);
}

#[test]
fn test_open_missing_index_fails() {
    let dir = TempDir::new().unwrap();
    assert!(DiskIndex::open(&IndexLayout::new(dir.path().join("nothing"))).is_err());
}

#[test]
fn test_config_file_drives_build() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    QuarryConfig::write_default_if_missing(&path).unwrap();
    let defaults = QuarryConfig::from_file(&path).unwrap();
    assert_eq!(defaults.table_size, QuarryConfig::default().table_size);

    let tuned = QuarryConfig::default()
        .with_table_size(211)
        .with_max_terms_per_shard(3)
        .with_worker_threads(3);
    tuned.write_to_file(&path).unwrap();
    // An existing file is left alone
    QuarryConfig::write_default_if_missing(&path).unwrap();
    let config = QuarryConfig::from_file(&path).unwrap();
    assert_eq!(config.max_terms_per_shard, 3);

    let mut indexer = Indexer::new(IndexLayout::new(dir.path().join("index")), config).unwrap();
    indexer.index_text("d0", "one two three four five").unwrap();
    indexer.index_text("d1", "five six seven").unwrap();
    let (index, report) = indexer.finish().unwrap();
    assert!(report.shards > 1);
    assert_eq!(index.table_size(), 211);
    assert_eq!(index.postings("five").unwrap().unwrap().doc_ids(), vec![0, 1]);
}
