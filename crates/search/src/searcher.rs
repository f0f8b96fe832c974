//! Query evaluation against a finished index

use crate::authority::{AuthorityScores, NoAuthority};
use crate::operators::{intersect, phrase_intersect, union};
use crate::query::{NormalizationMode, Query, QueryTerm, QueryType, RankingMode};
use crate::ranking::{rank, WeightedPostings};
use crate::wildcard::{expand, KGramProvider};
use quarry_core::{Error, PostingsList, PostingsSource, Result};
use quarry_engine::RankingWeights;
use tracing::debug;

static NO_AUTHORITY: NoAuthority = NoAuthority;

/// Evaluates queries over a [`PostingsSource`]
///
/// The searcher itself holds no state between queries.
pub struct Searcher<'a> {
    index: &'a dyn PostingsSource,
    kgrams: Option<&'a dyn KGramProvider>,
    authority: &'a dyn AuthorityScores,
    weights: RankingWeights,
}

impl<'a> Searcher<'a> {
    /// Searcher without wildcard support or authority scores
    pub fn new(index: &'a dyn PostingsSource) -> Self {
        Searcher {
            index,
            kgrams: None,
            authority: &NO_AUTHORITY,
            weights: RankingWeights::default(),
        }
    }

    /// Enable wildcard terms
    pub fn with_kgrams(mut self, kgrams: &'a dyn KGramProvider) -> Self {
        self.kgrams = Some(kgrams);
        self
    }

    /// Use `authority` for authority and combination ranking
    pub fn with_authority(mut self, authority: &'a dyn AuthorityScores) -> Self {
        self.authority = authority;
        self
    }

    /// Set the combination weights
    pub fn with_weights(mut self, weights: RankingWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Evaluate `query`
    ///
    /// Terms absent from the index never cause an error: intersection and
    /// phrase queries return an empty list, ranked queries ignore the term.
    pub fn search(
        &self,
        query: &Query,
        query_type: QueryType,
        ranking: RankingMode,
        normalization: NormalizationMode,
    ) -> Result<PostingsList> {
        if query.is_empty() {
            return Ok(PostingsList::new());
        }

        let result = match query_type {
            QueryType::Intersection => self.chain(query, intersect)?,
            QueryType::Phrase => self.chain(query, phrase_intersect)?,
            QueryType::Ranked => self.ranked(query, ranking, normalization)?,
        };
        debug!(
            target: "quarry::search",
            query = %query,
            ?query_type,
            hits = result.len(),
            "Evaluated query"
        );
        Ok(result)
    }

    /// Fold the per-position postings left to right with `op`
    fn chain(
        &self,
        query: &Query,
        op: fn(&PostingsList, &PostingsList) -> PostingsList,
    ) -> Result<PostingsList> {
        let mut terms = query.iter();
        let mut result = match terms.next() {
            Some(first) => self.position_postings(first)?,
            None => return Ok(PostingsList::new()),
        };
        for term in terms {
            if result.is_empty() {
                break;
            }
            let next = self.position_postings(term)?;
            if next.is_empty() {
                return Ok(PostingsList::new());
            }
            result = op(&result, &next);
        }
        Ok(result)
    }

    fn ranked(
        &self,
        query: &Query,
        ranking: RankingMode,
        normalization: NormalizationMode,
    ) -> Result<PostingsList> {
        let mut lists: Vec<(PostingsList, f64)> = Vec::new();
        for term in query.iter() {
            let expanded = if term.is_wildcard() {
                self.expand(&term.term)?
            } else {
                vec![term.term.clone()]
            };
            for t in expanded {
                if let Some(list) = self.index.postings(&t)? {
                    lists.push((list, term.weight));
                }
            }
        }

        let weighted: Vec<WeightedPostings<'_>> = lists
            .iter()
            .map(|(postings, weight)| WeightedPostings {
                postings,
                weight: *weight,
            })
            .collect();
        Ok(rank(
            self.index,
            &weighted,
            ranking,
            normalization,
            self.authority,
            &self.weights,
        ))
    }

    /// Postings standing in for one query position; a wildcard position is
    /// the union of its expansions
    fn position_postings(&self, term: &QueryTerm) -> Result<PostingsList> {
        if !term.is_wildcard() {
            return Ok(self.index.postings(&term.term)?.unwrap_or_default());
        }
        let mut merged = PostingsList::new();
        for t in self.expand(&term.term)? {
            if let Some(list) = self.index.postings(&t)? {
                merged = union(merged, list);
            }
        }
        Ok(merged)
    }

    fn expand(&self, pattern: &str) -> Result<Vec<String>> {
        match self.kgrams {
            Some(kgrams) => expand(kgrams, pattern),
            None => Err(Error::invalid_input(format!(
                "wildcard term {:?} needs a k-gram index",
                pattern
            ))),
        }
    }
}
