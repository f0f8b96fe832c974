//! Query evaluation over built indexes

use crate::common::*;
use quarry::{
    AuthorityTable, Indexer, IndexLayout, KGramIndex, NormalizationMode, PostingsSource,
    QuarryConfig, Query, QueryType, RankingMode, Searcher,
};
use tempfile::TempDir;

fn search(index: &TestIndex, text: &str, query_type: QueryType) -> quarry::PostingsList {
    Searcher::new(&index.index)
        .search(
            &Query::parse(text),
            query_type,
            RankingMode::TfIdf,
            NormalizationMode::Length,
        )
        .unwrap()
}

// ============================================================================
// Intersection
// ============================================================================

#[test]
fn test_three_document_intersection() {
    let index = TestIndex::single(&["a b", "b c", "a b c"]);
    assert_eq!(search(&index, "a b", QueryType::Intersection).doc_ids(), vec![0, 2]);
    assert_eq!(search(&index, "b a", QueryType::Intersection).doc_ids(), vec![0, 2]);
    assert_eq!(search(&index, "c", QueryType::Intersection).doc_ids(), vec![1, 2]);
}

#[test]
fn test_absent_terms_return_empty() {
    let index = TestIndex::single(&["a b", "b c"]);
    assert!(search(&index, "a missing", QueryType::Intersection).is_empty());
    assert!(search(&index, "missing", QueryType::Phrase).is_empty());
    assert!(search(&index, "missing", QueryType::Ranked).is_empty());
    assert!(index.postings("missing").is_none());
}

// ============================================================================
// Ranked
// ============================================================================

#[test]
fn test_term_in_every_document_scores_zero() {
    let index = TestIndex::single(&["a b", "b c", "a b c"]);
    for normalization in [NormalizationMode::Length, NormalizationMode::Euclidean] {
        let ranked = Searcher::new(&index.index)
            .search(&Query::parse("b"), QueryType::Ranked, RankingMode::TfIdf, normalization)
            .unwrap();
        assert_eq!(ranked.doc_ids(), vec![0, 1, 2]);
        assert!(ranked.iter().all(|e| e.score == 0.0));
    }
}

#[test]
fn test_ranked_prefers_rarer_and_denser() {
    let index = TestIndex::single(&["cat dog", "cat cat fish", "dog bird", "fish"]);
    let ranked = search(&index, "cat", QueryType::Ranked);
    // tf 2 over length 3 beats tf 1 over length 2
    assert_eq!(ranked.doc_ids(), vec![1, 0]);
    let idf = 2f64.ln();
    assert!((ranked.get(0).unwrap().score - 2.0 * idf / 3.0).abs() < 1e-12);
    assert!((ranked.get(1).unwrap().score - idf / 2.0).abs() < 1e-12);
}

#[test]
fn test_combination_with_authority_file() {
    let index = TestIndex::single(&["cat dog", "cat fish", "bird"]);
    let scores = index.dir.path().join("pagerank.txt");
    std::fs::write(&scores, "doc1 0.01\ndoc2 0.5\n").unwrap();
    let authority = AuthorityTable::load(&scores, &index.index).unwrap();

    let ranked = Searcher::new(&index.index)
        .with_authority(&authority)
        .search(
            &Query::parse("cat"),
            QueryType::Ranked,
            RankingMode::Combination,
            NormalizationMode::Length,
        )
        .unwrap();
    // doc2 does not match, so its authority never surfaces
    assert_eq!(ranked.doc_ids(), vec![1, 0]);
    let lexical = 1.5f64.ln() / 2.0;
    assert!((ranked.get(0).unwrap().score - (lexical + 5.0)).abs() < 1e-9);
}

// ============================================================================
// Phrase
// ============================================================================

#[test]
fn test_phrase_match_offset() {
    let index = TestIndex::single(&["the cat sat"]);
    let hit = search(&index, "the cat", QueryType::Phrase);
    assert_eq!(hit.doc_ids(), vec![0]);
    assert_eq!(hit.get(0).unwrap().offsets, vec![1]);
    assert!(search(&index, "cat the", QueryType::Phrase).is_empty());
}

#[test]
fn test_phrase_across_documents() {
    let index = TestIndex::single(&[
        "New York is big",
        "york new",
        "I love New York",
        "new and york",
    ]);
    assert_eq!(search(&index, "new york", QueryType::Phrase).doc_ids(), vec![0, 2]);
    assert_eq!(search(&index, "new york", QueryType::Intersection).doc_ids(), vec![0, 1, 2, 3]);
}

// ============================================================================
// Wildcards
// ============================================================================

#[test]
fn test_wildcard_over_built_vocabulary() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let mut indexer = Indexer::new(IndexLayout::new(dir.path()), QuarryConfig::for_testing()).unwrap();
    for text in ["red wine", "reed flute", "blue wine", "ready or not"] {
        indexer.index_text(text, text).unwrap();
    }
    let kgrams = KGramIndex::from_terms(2, indexer.terms()).unwrap();
    let (index, _) = indexer.finish().unwrap();

    let searcher = Searcher::new(&index).with_kgrams(&kgrams);
    let run = |text: &str, query_type| {
        searcher
            .search(&Query::parse(text), query_type, RankingMode::TfIdf, NormalizationMode::Length)
            .unwrap()
            .doc_ids()
    };
    assert_eq!(run("re*", QueryType::Intersection), vec![0, 1, 3]);
    assert_eq!(run("re*d", QueryType::Intersection), vec![0, 1]);
    assert_eq!(run("re* wine", QueryType::Phrase), vec![0]);
    assert_eq!(run("*ine", QueryType::Ranked), vec![0, 2]);
    assert_eq!(index.doc_count(), 4);
}
