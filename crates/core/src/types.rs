//! Core identifiers and document records

/// Dense document identifier, assigned strictly increasing at ingestion time
pub type DocId = u32;

/// Identifier of an on-disk partition (shard) of the index
pub type ShardId = u64;

/// Per-document metadata recorded at ingestion
///
/// Immutable once assigned. The vector norm used for cosine-style scoring is
/// kept separately because it is only known after the whole corpus is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Document identifier
    pub id: DocId,
    /// Source path (or any caller-chosen name)
    pub path: String,
    /// Number of tokens in the document
    pub length: u32,
}

impl Document {
    /// Create a new document record
    pub fn new(id: DocId, path: impl Into<String>, length: u32) -> Self {
        Document {
            id,
            path: path.into(),
            length,
        }
    }
}
