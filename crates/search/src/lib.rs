//! Query evaluation for quarry
//!
//! This crate answers queries over any [`PostingsSource`]:
//! - Query / QueryTerm: ordered, weighted query terms
//! - intersect / phrase_intersect / union: docID-ordered two-pointer operators
//! - rank: tf-idf scoring combined with authority scores
//! - expand / KGramIndex: wildcard expansion through k-grams
//! - Searcher: ties the above together
//!
//! [`PostingsSource`]: quarry_core::PostingsSource

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod authority;
pub mod kgram;
pub mod operators;
pub mod query;
pub mod ranking;
pub mod searcher;
pub mod wildcard;

pub use authority::{AuthorityScores, AuthorityTable, NoAuthority};
pub use kgram::KGramIndex;
pub use operators::{intersect, phrase_intersect, union};
pub use query::{NormalizationMode, Query, QueryTerm, QueryType, RankingMode, WILDCARD};
pub use ranking::{rank, WeightedPostings};
pub use searcher::Searcher;
pub use wildcard::{expand, KGramProvider, TermId};
