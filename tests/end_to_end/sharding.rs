//! Multi-shard builds must produce the same index as a single partition

use crate::common::*;
use quarry::{
    Error, Indexer, IndexLayout, NormalizationMode, PostingsSource, QuarryConfig, Query,
    QueryType, RankingMode, Searcher,
};
use tempfile::TempDir;

fn corpus() -> Vec<String> {
    (0..40)
        .map(|d| {
            (0..6)
                .map(|w| format!("w{}", (d * 7 + w * 3) % 53))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[test]
fn test_sharded_build_matches_single_partition() {
    let texts = corpus();
    let docs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let single = TestIndex::single(&docs);
    let sharded = TestIndex::sharded(&docs);

    assert_eq!(single.report.shards, 1);
    assert!(sharded.report.shards > 1);
    assert_eq!(sharded.report.merges, sharded.report.shards - 1);
    assert_eq!(single.report.terms, sharded.report.terms);
    assert_eq!(single.report.documents, 40);

    for t in 0..53 {
        let term = format!("w{}", t);
        let expected = single.postings(&term).map(|l| normalized(&l));
        let actual = sharded.postings(&term).map(|l| normalized(&l));
        assert_eq!(expected, actual, "postings differ for {}", term);
    }
    for doc in 0..40 {
        assert_eq!(single.index.doc_length(doc), sharded.index.doc_length(doc));
        assert_eq!(single.index.doc_norm(doc), sharded.index.doc_norm(doc));
        assert_eq!(single.index.doc_path(doc), sharded.index.doc_path(doc));
    }
}

#[test]
fn test_shard_files_removed_after_install() {
    let texts = corpus();
    let docs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let sharded = TestIndex::sharded(&docs);

    let mut names: Vec<String> = std::fs::read_dir(sharded.dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["data", "dictionary", "docInfo", "norms"]);
}

#[test]
fn test_phrase_survives_document_split_across_shards() {
    // Eight distinct terms fill the first shard mid-document
    let index = TestIndex::sharded(&["the cat a b c d e f g h the cat", "cat the"]);
    assert!(index.report.shards > 1);

    let the = index.postings("the").unwrap();
    assert_eq!(normalized(&the), vec![(0, vec![0, 10]), (1, vec![1])]);

    let hit = Searcher::new(&index.index)
        .search(
            &Query::parse("the cat"),
            QueryType::Phrase,
            RankingMode::TfIdf,
            NormalizationMode::Length,
        )
        .unwrap();
    assert_eq!(hit.doc_ids(), vec![0]);
    let mut offsets = hit.get(0).unwrap().offsets.clone();
    offsets.sort_unstable();
    assert_eq!(offsets, vec![1, 11]);
}

#[test]
fn test_inline_flush_under_backpressure() {
    let texts = corpus();
    let docs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let config = QuarryConfig::for_testing()
        .with_worker_threads(1)
        .with_max_queue_depth(1);
    let constrained = TestIndex::build(&docs, config);
    let single = TestIndex::single(&docs);

    assert_eq!(constrained.report.terms, single.report.terms);
    for t in 0..53 {
        let term = format!("w{}", t);
        assert_eq!(
            single.postings(&term).map(|l| l.doc_ids()),
            constrained.postings(&term).map(|l| l.doc_ids())
        );
    }
}

#[test]
fn test_vocabulary_larger_than_table_fails_build() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = QuarryConfig::for_testing()
        .with_table_size(17)
        .with_max_terms_per_shard(4);
    let mut indexer = Indexer::new(IndexLayout::new(dir.path()), config).unwrap();
    for d in 0..10 {
        let text = format!("t{} u{} v{}", d, d, d);
        indexer.index_text(&format!("doc{}", d), &text).unwrap();
    }
    let err = indexer.finish().err().unwrap();
    assert!(matches!(err, Error::Build(_)), "unexpected error: {:?}", err);
}
