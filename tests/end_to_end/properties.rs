//! Randomized corpora checked against a brute-force model

use crate::common::*;
use proptest::prelude::*;
use quarry::{NormalizationMode, Query, QueryType, RankingMode, Searcher};
use std::collections::BTreeMap;

const WORDS: &[&str] = &[
    "ash", "birch", "cedar", "elm", "fir", "hazel", "larch", "maple", "oak", "pine", "rowan",
    "yew",
];

fn texts(docs: &[Vec<usize>]) -> Vec<String> {
    docs.iter()
        .map(|doc| doc.iter().map(|&w| WORDS[w]).collect::<Vec<_>>().join(" "))
        .collect()
}

/// term -> docID -> offsets, computed directly from the token lists
fn model(docs: &[Vec<usize>]) -> BTreeMap<&'static str, BTreeMap<u32, Vec<u32>>> {
    let mut model: BTreeMap<&'static str, BTreeMap<u32, Vec<u32>>> = BTreeMap::new();
    for (doc, words) in docs.iter().enumerate() {
        for (offset, &w) in words.iter().enumerate() {
            model
                .entry(WORDS[w])
                .or_default()
                .entry(doc as u32)
                .or_default()
                .push(offset as u32);
        }
    }
    model
}

fn corpus() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0..WORDS.len(), 0..10), 1..16)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Every term's postings equal exactly what was inserted
    #[test]
    fn postings_match_inserted(docs in corpus()) {
        let owned = texts(&docs);
        let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
        let index = TestIndex::sharded(&refs);
        let expected = model(&docs);

        for word in WORDS {
            let actual = index.postings(word).map(|l| normalized(&l));
            let wanted = expected
                .get(word)
                .map(|docs| docs.iter().map(|(&d, o)| (d, o.clone())).collect::<Vec<_>>());
            prop_assert_eq!(actual, wanted);
        }
    }

    /// Intersection returns the documents holding every term, in any order
    #[test]
    fn intersection_matches_model(
        docs in corpus(),
        picks in prop::collection::vec(0..WORDS.len(), 1..4),
    ) {
        let owned = texts(&docs);
        let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
        let index = TestIndex::sharded(&refs);
        let searcher = Searcher::new(&index.index);

        let expected: Vec<u32> = docs
            .iter()
            .enumerate()
            .filter(|(_, doc)| picks.iter().all(|p| doc.contains(p)))
            .map(|(d, _)| d as u32)
            .collect();

        let mut order = picks.clone();
        for _ in 0..order.len() {
            let text: Vec<&str> = order.iter().map(|&w| WORDS[w]).collect();
            let hits = searcher
                .search(
                    &Query::parse(&text.join(" ")),
                    QueryType::Intersection,
                    RankingMode::TfIdf,
                    NormalizationMode::Length,
                )
                .unwrap();
            prop_assert_eq!(hits.doc_ids(), expected.clone());
            order.rotate_left(1);
        }
    }
}
