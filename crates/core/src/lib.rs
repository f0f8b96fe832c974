//! Core types and traits for quarry
//!
//! This crate defines the foundational types used throughout the system:
//! - DocId / ShardId: identifiers
//! - Document: per-document metadata
//! - PostingsEntry / PostingsList: docID-ordered postings with positions
//! - Blob codec: the `term<postings` text form stored in data files
//! - Error: Error type hierarchy
//! - Traits: PostingsSource, the read interface of a finished index

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod postings;
pub mod traits;
pub mod types;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use postings::{
    decode_blob, encode_blob, split_blob, validate_term, PostingsEntry, PostingsList,
    TERM_DELIMITER,
};
pub use traits::PostingsSource;
pub use types::{DocId, Document, ShardId};
