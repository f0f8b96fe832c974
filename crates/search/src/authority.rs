//! Document authority scores
//!
//! Authority (PageRank, HITS, ...) is computed elsewhere; ranking only needs
//! a per-document lookup that defaults to zero.

use quarry_core::{DocId, Error, PostingsSource, Result};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Per-document authority score
pub trait AuthorityScores: Send + Sync {
    /// Score of `doc`, 0 when unknown
    fn score(&self, doc: DocId) -> f64;
}

/// Every document scores 0
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthority;

impl AuthorityScores for NoAuthority {
    fn score(&self, _doc: DocId) -> f64 {
        0.0
    }
}

/// Scores held in memory
#[derive(Debug, Clone, Default)]
pub struct AuthorityTable {
    scores: FxHashMap<DocId, f64>,
}

impl AuthorityTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the score of a document
    pub fn insert(&mut self, doc: DocId, score: f64) {
        self.scores.insert(doc, score);
    }

    /// Number of scored documents
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// True if no document is scored
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Load `name score` lines, resolving each name against the indexed
    /// document paths: first as a full path, then as a file name
    ///
    /// Names matching no document are logged and skipped.
    pub fn load(path: &Path, index: &dyn PostingsSource) -> Result<Self> {
        let mut by_path: FxHashMap<&str, DocId> = FxHashMap::default();
        let mut by_name: FxHashMap<&str, DocId> = FxHashMap::default();
        for doc in 0..index.doc_count() as DocId {
            if let Some(p) = index.doc_path(doc) {
                by_path.insert(p, doc);
                let name = p.rsplit(['/', '\\']).next().unwrap_or(p);
                by_name.entry(name).or_insert(doc);
            }
        }

        let mut table = AuthorityTable::new();
        let mut unknown = 0usize;
        for line in BufReader::new(File::open(path)?).lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (name, score) = line
                .rsplit_once(char::is_whitespace)
                .ok_or_else(|| Error::corruption(format!("malformed authority line: {:?}", line)))?;
            let name = name.trim();
            let score: f64 = score
                .parse()
                .map_err(|_| Error::corruption(format!("malformed authority score: {:?}", line)))?;

            match by_path.get(name).or_else(|| by_name.get(name)) {
                Some(&doc) => table.insert(doc, score),
                None => {
                    unknown += 1;
                    warn!(target: "quarry::search", name, "Authority score for unknown document");
                }
            }
        }

        info!(target: "quarry::search", scored = table.len(), unknown, "Loaded authority scores");
        Ok(table)
    }
}

impl AuthorityScores for AuthorityTable {
    fn score(&self, doc: DocId) -> f64 {
        self.scores.get(&doc).copied().unwrap_or(0.0)
    }
}
