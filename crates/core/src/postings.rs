//! Postings lists and their on-disk text form
//!
//! This module provides:
//! - PostingsEntry: one document's positions for a term
//! - PostingsList: entries in strictly ascending docID order
//! - The blob codec used by the data store: `term<DELIM>doc:o1,o2-doc:o1\n`
//! - The linear docID merge shared by shard merging and wildcard union
//!
//! # Ordering
//!
//! Every two-pointer algorithm over postings relies on entries being sorted
//! by docID with at most one entry per document. `merge` preserves this;
//! offsets within one entry are kept in arrival order and are NOT re-sorted.

use crate::error::{Error, Result};
use crate::types::DocId;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Separates the term from its serialized postings inside a data blob
pub const TERM_DELIMITER: char = '<';

/// Separates postings entries
const ENTRY_SEPARATOR: char = '-';

/// Separates a docID from its offsets
const DOC_SEPARATOR: char = ':';

/// Separates offsets
const OFFSET_SEPARATOR: char = ',';

// ============================================================================
// PostingsEntry
// ============================================================================

/// Entry in a postings list
///
/// `score` holds the term frequency while indexing and the relevance score
/// in ranked results.
#[derive(Debug, Clone, PartialEq)]
pub struct PostingsEntry {
    /// Document containing the term
    pub doc_id: DocId,
    /// Token positions of the term in the document, in arrival order
    pub offsets: Vec<u32>,
    /// Term frequency (index) or relevance score (ranked results)
    pub score: f64,
}

impl PostingsEntry {
    /// Create an entry with no positions and a zero score
    pub fn new(doc_id: DocId) -> Self {
        PostingsEntry {
            doc_id,
            offsets: Vec::new(),
            score: 0.0,
        }
    }

    /// Create an entry holding a single position
    pub fn with_offset(doc_id: DocId, offset: u32) -> Self {
        PostingsEntry {
            doc_id,
            offsets: vec![offset],
            score: 1.0,
        }
    }

    /// Create a ranked-result entry carrying only a score
    pub fn scored(doc_id: DocId, score: f64) -> Self {
        PostingsEntry {
            doc_id,
            offsets: Vec::new(),
            score,
        }
    }

    /// Record one more occurrence of the term
    pub fn add_offset(&mut self, offset: u32) {
        self.offsets.push(offset);
        self.score += 1.0;
    }

    /// Number of recorded positions
    pub fn term_frequency(&self) -> usize {
        self.offsets.len()
    }

    /// Fold another entry for the same document into this one
    ///
    /// Offsets are concatenated (self first), scores added.
    fn absorb(&mut self, other: PostingsEntry) {
        debug_assert_eq!(self.doc_id, other.doc_id);
        self.offsets.extend(other.offsets);
        self.score += other.score;
    }
}

impl fmt::Display for PostingsEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.doc_id, DOC_SEPARATOR)?;
        for (i, offset) in self.offsets.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", OFFSET_SEPARATOR)?;
            }
            write!(f, "{}", offset)?;
        }
        Ok(())
    }
}

impl FromStr for PostingsEntry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (doc, offsets) = s
            .split_once(DOC_SEPARATOR)
            .ok_or_else(|| Error::corruption(format!("postings entry without docID: {:?}", s)))?;
        let doc_id = doc
            .parse::<DocId>()
            .map_err(|e| Error::corruption(format!("bad docID {:?}: {}", doc, e)))?;

        let mut entry = PostingsEntry::new(doc_id);
        if !offsets.is_empty() {
            for offset in offsets.split(OFFSET_SEPARATOR) {
                let offset = offset
                    .parse::<u32>()
                    .map_err(|e| Error::corruption(format!("bad offset {:?}: {}", offset, e)))?;
                entry.add_offset(offset);
            }
        }
        Ok(entry)
    }
}

// ============================================================================
// PostingsList
// ============================================================================

/// List of documents containing a term, ascending by docID
///
/// Ranked search results reuse this type with entries ordered by descending
/// score instead; every other producer keeps docID order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingsList {
    /// Document entries
    pub entries: Vec<PostingsEntry>,
}

impl PostingsList {
    /// Create a new empty postings list
    pub fn new() -> Self {
        PostingsList {
            entries: Vec::new(),
        }
    }

    /// Wrap already-ordered entries
    pub fn from_entries(entries: Vec<PostingsEntry>) -> Self {
        PostingsList { entries }
    }

    /// Append an entry at the end of the list
    pub fn push(&mut self, entry: PostingsEntry) {
        self.entries.push(entry);
    }

    /// Number of documents in the list (the term's document frequency)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at position `i`
    pub fn get(&self, i: usize) -> Option<&PostingsEntry> {
        self.entries.get(i)
    }

    /// Last entry, mutable
    pub fn last_mut(&mut self) -> Option<&mut PostingsEntry> {
        self.entries.last_mut()
    }

    /// Iterate over entries
    pub fn iter(&self) -> std::slice::Iter<'_, PostingsEntry> {
        self.entries.iter()
    }

    /// DocIDs in list order
    pub fn doc_ids(&self) -> Vec<DocId> {
        self.entries.iter().map(|e| e.doc_id).collect()
    }

    /// True when docIDs are strictly ascending
    pub fn is_ascending(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].doc_id < w[1].doc_id)
    }

    /// Sort entries by descending score; equal scores keep their order
    pub fn sort_by_score(&mut self) {
        self.entries.sort_by(|a, b| b.score.total_cmp(&a.score));
    }

    /// Combine two docID-ordered lists into one by a linear walk
    ///
    /// Entries for the same document are fused: offsets from `self` come
    /// first, followed by those from `other`, and scores add up.
    pub fn merge(self, other: PostingsList) -> PostingsList {
        let mut merged = Vec::with_capacity(self.len() + other.len());
        let mut left = self.entries.into_iter().peekable();
        let mut right = other.entries.into_iter().peekable();

        loop {
            let order = match (left.peek(), right.peek()) {
                (Some(l), Some(r)) => l.doc_id.cmp(&r.doc_id),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => break,
            };
            let next = match order {
                Ordering::Less => left.next(),
                Ordering::Greater => right.next(),
                Ordering::Equal => match (left.next(), right.next()) {
                    (Some(mut l), Some(r)) => {
                        l.absorb(r);
                        Some(l)
                    }
                    _ => None,
                },
            };
            if let Some(entry) = next {
                merged.push(entry);
            }
        }

        PostingsList { entries: merged }
    }
}

impl IntoIterator for PostingsList {
    type Item = PostingsEntry;
    type IntoIter = std::vec::IntoIter<PostingsEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a PostingsList {
    type Item = &'a PostingsEntry;
    type IntoIter = std::slice::Iter<'a, PostingsEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for PostingsList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", ENTRY_SEPARATOR)?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl FromStr for PostingsList {
    type Err = Error;

    /// Parse the serialized form, rejecting lists that are not docID-ascending
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let mut list = PostingsList::new();
        if s.is_empty() {
            return Ok(list);
        }
        for part in s.split(ENTRY_SEPARATOR) {
            let entry: PostingsEntry = part.parse()?;
            if let Some(last) = list.entries.last() {
                if last.doc_id >= entry.doc_id {
                    return Err(Error::corruption(format!(
                        "postings not ascending: doc {} follows doc {}",
                        entry.doc_id, last.doc_id
                    )));
                }
            }
            list.push(entry);
        }
        Ok(list)
    }
}

// ============================================================================
// Blob codec
// ============================================================================

/// Reject terms that would break the blob framing
pub fn validate_term(term: &str) -> Result<()> {
    if term.is_empty() {
        return Err(Error::invalid_input("empty term"));
    }
    if term.contains(TERM_DELIMITER) || term.contains('\n') || term.contains('\r') {
        return Err(Error::invalid_input(format!(
            "term {:?} contains a reserved character",
            term
        )));
    }
    Ok(())
}

/// Serialize a term and its postings into one self-describing data blob
pub fn encode_blob(term: &str, postings: &PostingsList) -> String {
    format!("{}{}{}\n", term, TERM_DELIMITER, postings)
}

/// Split a blob into its term and its still-serialized postings
pub fn split_blob(blob: &str) -> Result<(&str, &str)> {
    let blob = blob.trim_end_matches(['\n', '\r']);
    blob.split_once(TERM_DELIMITER)
        .ok_or_else(|| Error::corruption(format!("blob without term delimiter: {:?}", truncate(blob))))
}

/// Fully decode a blob
pub fn decode_blob(blob: &str) -> Result<(&str, PostingsList)> {
    let (term, postings) = split_blob(blob)?;
    Ok((term, postings.parse()?))
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(64) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ============================================================================
// Tests
// ============================================================================
