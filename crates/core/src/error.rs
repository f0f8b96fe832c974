//! Error types for quarry
//!
//! This module defines all error types used throughout the index.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! A term that is simply absent from the index is never an error: lookups
//! return `Ok(None)` and query operators return an empty list.

use crate::types::DocId;
use std::io;
use thiserror::Error;

/// Result type alias for quarry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the index
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (file open, seek, read, write)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// On-disk structure does not decode (bad blob, short record, pointer past end)
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Dictionary has no room left for another distinct term
    #[error("Dictionary capacity exceeded: {terms} terms do not fit a table of {table_size} slots")]
    CapacityExceeded {
        /// Number of slots in the table
        table_size: u64,
        /// Number of terms that would be stored after the insert
        terms: u64,
    },

    /// A posting arrived with a docID lower than one already recorded for the term
    #[error("Postings order violated for term {term:?}: got doc {got} after doc {last}")]
    OrderViolation {
        /// Offending term
        term: String,
        /// Last docID already in the term's postings list
        last: DocId,
        /// Incoming docID
        got: DocId,
    },

    /// Invalid term, query pattern, or argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be read or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// A shard flush or merge task failed
    #[error("Build error: {0}")]
    Build(String),
}

impl Error {
    /// Build a corruption error from anything displayable
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Build an invalid-input error from anything displayable
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// True for errors that describe damaged on-disk state
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }
}
