//! Core traits for index abstraction
//!
//! This module defines the read interface that query operators consume,
//! so evaluation does not depend on how (or whether) postings live on disk.

use crate::error::Result;
use crate::postings::PostingsList;
use crate::types::DocId;

/// Read-only view of a finished index
///
/// Thread safety: All methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait PostingsSource: Send + Sync {
    /// Get the postings list for a term
    ///
    /// Returns `Ok(None)` when the term is not indexed.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or damaged index files, never for a miss.
    fn postings(&self, term: &str) -> Result<Option<PostingsList>>;

    /// Number of documents in the corpus
    fn doc_count(&self) -> usize;

    /// Token count of a document
    fn doc_length(&self, doc: DocId) -> Option<u32>;

    /// Precomputed Euclidean length of a document's tf-idf vector
    fn doc_norm(&self, doc: DocId) -> Option<f64>;

    /// Path recorded for a document
    fn doc_path(&self, doc: DocId) -> Option<&str>;
}
