//! In-memory k-gram index over the indexed vocabulary

use crate::wildcard::{KGramProvider, TermId, END_MARKER, START_MARKER};
use quarry_core::{Error, Result};
use rustc_hash::FxHashMap;
use tracing::info;

/// Maps each k-gram of `^term$` to the ids of the terms containing it
#[derive(Debug, Clone)]
pub struct KGramIndex {
    k: usize,
    index: FxHashMap<String, Vec<TermId>>,
    terms: Vec<String>,
    ids: FxHashMap<String, TermId>,
}

impl KGramIndex {
    /// Create an empty index of `k`-grams
    pub fn new(k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::invalid_input("k-gram length must be at least 1"));
        }
        Ok(KGramIndex {
            k,
            index: FxHashMap::default(),
            terms: Vec::new(),
            ids: FxHashMap::default(),
        })
    }

    /// Index a vocabulary; terms are added in sorted order
    pub fn from_terms<I, S>(k: usize, terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sorted: Vec<String> = terms.into_iter().map(|t| t.as_ref().to_string()).collect();
        sorted.sort();
        sorted.dedup();

        let mut index = KGramIndex::new(k)?;
        for term in &sorted {
            index.insert(term);
        }
        info!(target: "quarry::search", k, terms = index.len(), kgrams = index.index.len(), "Built k-gram index");
        Ok(index)
    }

    /// Add a term, returning its id; re-adding returns the existing id
    pub fn insert(&mut self, term: &str) -> TermId {
        if let Some(&id) = self.ids.get(term) {
            return id;
        }
        let id = self.terms.len() as TermId;
        self.terms.push(term.to_string());
        self.ids.insert(term.to_string(), id);

        for kgram in self.kgrams(term) {
            let ids = self.index.entry(kgram).or_default();
            // Ids only grow, so a repeated k-gram can only repeat the last id
            if ids.last() != Some(&id) {
                ids.push(id);
            }
        }
        id
    }

    /// The k-grams of `^term$`
    pub fn kgrams(&self, term: &str) -> Vec<String> {
        let padded: Vec<char> = std::iter::once(START_MARKER)
            .chain(term.chars())
            .chain(std::iter::once(END_MARKER))
            .collect();
        padded
            .windows(self.k)
            .map(|w| w.iter().collect())
            .collect()
    }

    /// Id of an indexed term
    pub fn id(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    /// Number of indexed terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True if no term is indexed
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl KGramProvider for KGramIndex {
    fn k(&self) -> usize {
        self.k
    }

    fn postings(&self, kgram: &str) -> Option<&[TermId]> {
        self.index.get(kgram).map(Vec::as_slice)
    }

    fn term(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    fn all_terms(&self) -> Vec<TermId> {
        (0..self.terms.len() as TermId).collect()
    }
}
