//! Query model
//!
//! A query is an ordered list of weighted terms. Order matters for phrase
//! queries; weights matter for ranked queries.

use std::fmt;

/// Marker for the single wildcard a query term may contain
pub const WILDCARD: char = '*';

// ============================================================================
// QueryTerm
// ============================================================================

/// One term of a query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTerm {
    /// Term text, possibly containing one wildcard
    pub term: String,
    /// Multiplier applied to the term's ranked score
    pub weight: f64,
}

impl QueryTerm {
    /// Create a term with weight 1
    pub fn new(term: impl Into<String>) -> Self {
        Self::weighted(term, 1.0)
    }

    /// Create a term with an explicit weight
    pub fn weighted(term: impl Into<String>, weight: f64) -> Self {
        QueryTerm {
            term: term.into(),
            weight,
        }
    }

    /// True if the term is a wildcard pattern
    pub fn is_wildcard(&self) -> bool {
        self.term.contains(WILDCARD)
    }
}

// ============================================================================
// Query
// ============================================================================

/// Ordered, weighted query terms
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Terms in query order
    pub terms: Vec<QueryTerm>,
}

impl Query {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse whitespace separated, lowercased terms with weight 1
    pub fn parse(text: &str) -> Self {
        Query {
            terms: text
                .split_whitespace()
                .map(|t| QueryTerm::new(t.to_lowercase()))
                .collect(),
        }
    }

    /// Append a term
    pub fn push(&mut self, term: QueryTerm) {
        self.terms.push(term);
    }

    /// Builder: append a weighted term
    pub fn with_term(mut self, term: impl Into<String>, weight: f64) -> Self {
        self.push(QueryTerm::weighted(term, weight));
        self
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True if there are no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Manhattan length of the weight vector
    pub fn length(&self) -> f64 {
        self.terms.iter().map(|t| t.weight.abs()).sum()
    }

    /// Iterate over the terms
    pub fn iter(&self) -> std::slice::Iter<'_, QueryTerm> {
        self.terms.iter()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, t) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&t.term)?;
        }
        Ok(())
    }
}

// ============================================================================
// Modes
// ============================================================================

/// Which operator evaluates the query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// Documents containing every term
    Intersection,
    /// Documents containing the terms at consecutive positions
    Phrase,
    /// Documents containing any term, scored and sorted
    Ranked,
}

/// How ranked scores are composed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingMode {
    /// Lexical tf-idf score only
    TfIdf,
    /// Authority score only
    Authority,
    /// Weighted sum of lexical and authority scores
    Combination,
}

/// Per-document normalization of the lexical score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationMode {
    /// Divide by the document's token count
    Length,
    /// Divide by the document's Euclidean tf-idf norm
    Euclidean,
}
