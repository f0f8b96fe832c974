//! Ranked retrieval
//!
//! ```text
//! lexical(d) = Σ_t  tf(t,d) · ln(N / df(t)) · weight(t) / norm(d)
//! final(d)   = lexical(d)                                  (TfIdf)
//!            | authority(d)                                (Authority)
//!            | λ_lex · lexical(d) + λ_auth · authority(d)  (Combination)
//! ```
//!
//! A document whose norm is missing or zero contributes no lexical score.
//! Results are sorted by descending score; equal scores keep ascending
//! docID order.

use crate::authority::AuthorityScores;
use crate::query::{NormalizationMode, RankingMode};
use quarry_core::{DocId, PostingsEntry, PostingsList, PostingsSource};
use quarry_engine::RankingWeights;
use std::collections::BTreeMap;

/// Postings of one query term with its weight
#[derive(Debug, Clone, Copy)]
pub struct WeightedPostings<'a> {
    /// The term's postings
    pub postings: &'a PostingsList,
    /// Query weight of the term
    pub weight: f64,
}

/// Score and sort every document matching at least one term
pub fn rank(
    index: &dyn PostingsSource,
    terms: &[WeightedPostings<'_>],
    ranking: RankingMode,
    normalization: NormalizationMode,
    authority: &dyn AuthorityScores,
    weights: &RankingWeights,
) -> PostingsList {
    let n = index.doc_count() as f64;
    let mut lexical: BTreeMap<DocId, f64> = BTreeMap::new();

    for term in terms {
        let df = term.postings.len();
        if df == 0 {
            continue;
        }
        let idf = if n > 0.0 { (n / df as f64).ln() } else { 0.0 };
        for entry in term.postings {
            let norm = match normalization {
                NormalizationMode::Length => index.doc_length(entry.doc_id).map(f64::from),
                NormalizationMode::Euclidean => index.doc_norm(entry.doc_id),
            };
            let contribution = match norm {
                Some(norm) if norm > 0.0 => {
                    entry.term_frequency() as f64 * idf * term.weight / norm
                }
                _ => 0.0,
            };
            *lexical.entry(entry.doc_id).or_insert(0.0) += contribution;
        }
    }

    let mut result = PostingsList::from_entries(
        lexical
            .into_iter()
            .map(|(doc, lex)| {
                let score = match ranking {
                    RankingMode::TfIdf => lex,
                    RankingMode::Authority => authority.score(doc),
                    RankingMode::Combination => {
                        weights.lexical_weight * lex + weights.authority_weight * authority.score(doc)
                    }
                };
                PostingsEntry::scored(doc, score)
            })
            .collect(),
    );
    result.sort_by_score();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::{AuthorityTable, NoAuthority};
    use quarry_core::Result;

    /// Four documents with fixed lengths and norms
    struct Corpus;

    impl PostingsSource for Corpus {
        fn postings(&self, _term: &str) -> Result<Option<PostingsList>> {
            Ok(None)
        }
        fn doc_count(&self) -> usize {
            4
        }
        fn doc_length(&self, doc: DocId) -> Option<u32> {
            [2, 4, 0, 1].get(doc as usize).copied()
        }
        fn doc_norm(&self, doc: DocId) -> Option<f64> {
            [1.0, 2.0, 0.0].get(doc as usize).copied()
        }
        fn doc_path(&self, _doc: DocId) -> Option<&str> {
            None
        }
    }

    fn postings(entries: &[(DocId, usize)]) -> PostingsList {
        let mut list = PostingsList::new();
        for &(doc, tf) in entries {
            let mut entry = PostingsEntry::new(doc);
            for o in 0..tf {
                entry.add_offset(o as u32);
            }
            list.push(entry);
        }
        list
    }

    fn weighted(list: &PostingsList) -> WeightedPostings<'_> {
        WeightedPostings {
            postings: list,
            weight: 1.0,
        }
    }

    #[test]
    fn test_tf_idf_length_normalized() {
        let cat = postings(&[(0, 2), (1, 1)]);
        let ranked = rank(
            &Corpus,
            &[weighted(&cat)],
            RankingMode::TfIdf,
            NormalizationMode::Length,
            &NoAuthority,
            &RankingWeights::default(),
        );
        let idf = 2f64.ln();
        assert_eq!(ranked.doc_ids(), vec![0, 1]);
        assert!((ranked.get(0).unwrap().score - 2.0 * idf / 2.0).abs() < 1e-12);
        assert!((ranked.get(1).unwrap().score - idf / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_or_missing_norm_scores_zero() {
        let dog = postings(&[(2, 3), (3, 1)]);
        let ranked = rank(
            &Corpus,
            &[weighted(&dog)],
            RankingMode::TfIdf,
            NormalizationMode::Euclidean,
            &NoAuthority,
            &RankingWeights::default(),
        );
        assert_eq!(ranked.doc_ids(), vec![2, 3]);
        assert!(ranked.iter().all(|e| e.score == 0.0));
    }

    #[test]
    fn test_term_in_every_document_scores_zero() {
        let everywhere = postings(&[(0, 1), (1, 1), (2, 1), (3, 1)]);
        let ranked = rank(
            &Corpus,
            &[weighted(&everywhere)],
            RankingMode::TfIdf,
            NormalizationMode::Length,
            &NoAuthority,
            &RankingWeights::default(),
        );
        assert_eq!(ranked.doc_ids(), vec![0, 1, 2, 3]);
        assert!(ranked.iter().all(|e| e.score == 0.0));
    }

    #[test]
    fn test_authority_and_combination() {
        let term = postings(&[(0, 1), (1, 1)]);
        let mut authority = AuthorityTable::new();
        authority.insert(1, 0.01);
        authority.insert(3, 1.0);

        let by_authority = rank(
            &Corpus,
            &[weighted(&term)],
            RankingMode::Authority,
            NormalizationMode::Euclidean,
            &authority,
            &RankingWeights::default(),
        );
        // Only matching documents are ranked
        assert_eq!(by_authority.doc_ids(), vec![1, 0]);

        let weights = RankingWeights {
            lexical_weight: 1.0,
            authority_weight: 500.0,
        };
        let combined = rank(
            &Corpus,
            &[weighted(&term)],
            RankingMode::Combination,
            NormalizationMode::Euclidean,
            &authority,
            &weights,
        );
        let idf = 2f64.ln();
        assert_eq!(combined.doc_ids(), vec![1, 0]);
        assert!((combined.get(0).unwrap().score - (idf / 2.0 + 5.0)).abs() < 1e-12);
        assert!((combined.get(1).unwrap().score - idf).abs() < 1e-12);
    }

    #[test]
    fn test_weights_and_accumulation() {
        let a = postings(&[(0, 1)]);
        let b = postings(&[(0, 1), (1, 1)]);
        let ranked = rank(
            &Corpus,
            &[
                WeightedPostings { postings: &a, weight: 2.0 },
                WeightedPostings { postings: &b, weight: 1.0 },
            ],
            RankingMode::TfIdf,
            NormalizationMode::Euclidean,
            &NoAuthority,
            &RankingWeights::default(),
        );
        let expected = 4f64.ln() * 2.0 + 2f64.ln();
        assert!((ranked.get(0).unwrap().score - expected).abs() < 1e-12);
        assert_eq!(ranked.doc_ids(), vec![0, 1]);
    }
}
