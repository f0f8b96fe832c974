//! Postings list operators
//!
//! Every operator walks its inputs with two pointers and relies on strictly
//! ascending docIDs; every output is again strictly ascending.

use quarry_core::{PostingsEntry, PostingsList};
use std::cmp::Ordering;

/// Documents present in both lists
///
/// Each result entry is the left list's entry, unchanged.
pub fn intersect(left: &PostingsList, right: &PostingsList) -> PostingsList {
    let mut result = PostingsList::new();
    let (mut i, mut j) = (0, 0);
    while let (Some(a), Some(b)) = (left.get(i), right.get(j)) {
        match a.doc_id.cmp(&b.doc_id) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                result.push(a.clone());
                i += 1;
                j += 1;
            }
        }
    }
    result
}

/// Documents where a right-list position directly follows a left-list one
///
/// The result records the matching right positions, so phrases of any
/// length chain left to right.
pub fn phrase_intersect(left: &PostingsList, right: &PostingsList) -> PostingsList {
    let mut result = PostingsList::new();
    let (mut i, mut j) = (0, 0);
    while let (Some(a), Some(b)) = (left.get(i), right.get(j)) {
        match a.doc_id.cmp(&b.doc_id) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                // Nested scan: offsets need not be sorted after shard merges
                let mut entry = PostingsEntry::new(a.doc_id);
                for &r in &b.offsets {
                    if a.offsets.iter().any(|&l| l.checked_add(1) == Some(r)) {
                        entry.add_offset(r);
                    }
                }
                if !entry.offsets.is_empty() {
                    result.push(entry);
                }
                i += 1;
                j += 1;
            }
        }
    }
    result
}

/// Documents present in either list; shared documents have their offsets
/// concatenated and scores summed
pub fn union(left: PostingsList, right: PostingsList) -> PostingsList {
    left.merge(right)
}
