//! Wildcard expansion through a k-gram index
//!
//! A pattern holds exactly one `*`. The fixed text before it is padded with
//! `^` and the text after it with `$`; the k-gram at each padded boundary
//! selects candidate terms, which are then verified against the pattern.
//!
//! ```text
//! red*   -> "^r" (k = 2)           -> verify starts_with("red")
//! *less  -> "s$"                   -> verify ends_with("less")
//! re*d   -> "^r" ∩ "d$"            -> verify both, and length
//! ```

use crate::query::WILDCARD;
use quarry_core::{Error, Result};
use tracing::{debug, warn};

/// Identifier of a term inside a k-gram provider
pub type TermId = u32;

/// Start-of-term padding
pub const START_MARKER: char = '^';
/// End-of-term padding
pub const END_MARKER: char = '$';

/// Maps k-grams to the terms containing them
pub trait KGramProvider: Send + Sync {
    /// Length of every k-gram
    fn k(&self) -> usize;

    /// Ascending ids of the terms containing `kgram`
    fn postings(&self, kgram: &str) -> Option<&[TermId]>;

    /// Text of a term id
    fn term(&self, id: TermId) -> Option<&str>;

    /// Every term id; the default assumes ids are dense from 0
    fn all_terms(&self) -> Vec<TermId> {
        (0..)
            .map_while(|id| self.term(id).map(|_| id))
            .collect()
    }

    /// Ids present in both ascending lists
    fn intersect(&self, a: &[TermId], b: &[TermId]) -> Vec<TermId> {
        let mut result = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    result.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        result
    }
}

/// Leading k-gram of `^prefix`, if long enough
fn head_kgram(prefix: &str, k: usize) -> Option<String> {
    let padded: Vec<char> = std::iter::once(START_MARKER).chain(prefix.chars()).collect();
    (padded.len() >= k).then(|| padded[..k].iter().collect())
}

/// Trailing k-gram of `suffix$`, if long enough
fn tail_kgram(suffix: &str, k: usize) -> Option<String> {
    let padded: Vec<char> = suffix.chars().chain(std::iter::once(END_MARKER)).collect();
    (padded.len() >= k).then(|| padded[padded.len() - k..].iter().collect())
}

/// Indexed terms matching `pattern`, sorted
///
/// Fails if the pattern has no wildcard, more than one, or no fixed text.
/// When neither fragment is long enough to form a k-gram, every indexed term
/// is a candidate.
pub fn expand(provider: &dyn KGramProvider, pattern: &str) -> Result<Vec<String>> {
    let (prefix, suffix) = pattern
        .split_once(WILDCARD)
        .ok_or_else(|| Error::invalid_input(format!("{:?} is not a wildcard pattern", pattern)))?;
    if suffix.contains(WILDCARD) {
        return Err(Error::invalid_input(format!(
            "{:?} has more than one wildcard",
            pattern
        )));
    }
    if prefix.is_empty() && suffix.is_empty() {
        return Err(Error::invalid_input("wildcard pattern without fixed text"));
    }

    let k = provider.k();
    let mut candidate_sets: Vec<&[TermId]> = Vec::with_capacity(2);
    let mut usable = false;
    if !prefix.is_empty() {
        if let Some(kgram) = head_kgram(prefix, k) {
            usable = true;
            candidate_sets.push(provider.postings(&kgram).unwrap_or(&[]));
        }
    }
    if !suffix.is_empty() {
        if let Some(kgram) = tail_kgram(suffix, k) {
            usable = true;
            candidate_sets.push(provider.postings(&kgram).unwrap_or(&[]));
        }
    }
    let candidates = match candidate_sets.as_slice() {
        [only] => only.to_vec(),
        [a, b] => provider.intersect(a, b),
        _ => Vec::new(),
    };
    let candidates = if usable {
        candidates
    } else {
        warn!(target: "quarry::search", pattern, k, "Wildcard fragment too short for k-gram lookup, scanning vocabulary");
        provider.all_terms()
    };

    let min_len = prefix.len() + suffix.len();
    let mut matches: Vec<String> = candidates
        .into_iter()
        .filter_map(|id| provider.term(id))
        .filter(|t| t.len() >= min_len && t.starts_with(prefix) && t.ends_with(suffix))
        .map(str::to_string)
        .collect();
    matches.sort();
    matches.dedup();

    debug!(target: "quarry::search", pattern, expansions = matches.len(), "Expanded wildcard");
    Ok(matches)
}
