//! Ingestion driver
//!
//! Assigns dense docIDs in scan order, tokenizes each document, feeds the
//! builder, and records the statistics needed for document norms. Norms are
//! written once the build has finished, since they depend on corpus-wide
//! document frequencies:
//!
//! ```text
//! norm(d) = sqrt( Σ_t (tf(t,d) · ln(N / df(t)))² )
//! ```

use crate::builder::{BuildReport, ShardedIndexBuilder};
use crate::config::QuarryConfig;
use crate::disk_index::DiskIndex;
use crate::tokenizer::{SimpleTokenizer, Tokenizer};
use quarry_core::{DocId, Document, Error, Result};
use quarry_storage::documents::write_norms;
use quarry_storage::IndexLayout;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Drives a build from raw documents
pub struct Indexer<T: Tokenizer = SimpleTokenizer> {
    builder: ShardedIndexBuilder,
    tokenizer: T,
    next_doc: DocId,
    vocabulary: FxHashMap<String, u32>,
    document_frequency: Vec<u32>,
    // (term id, term frequency) per document, in docID order
    doc_vectors: Vec<Vec<(u32, u32)>>,
    // Set once a document failed part way; its postings are already buffered
    failed: bool,
}

impl Indexer<SimpleTokenizer> {
    /// Start a build using the default tokenizer
    pub fn new(layout: IndexLayout, config: QuarryConfig) -> Result<Self> {
        Self::with_tokenizer(layout, config, SimpleTokenizer::new())
    }
}

impl<T: Tokenizer> Indexer<T> {
    /// Start a build using `tokenizer`
    pub fn with_tokenizer(layout: IndexLayout, config: QuarryConfig, tokenizer: T) -> Result<Self> {
        Ok(Indexer {
            builder: ShardedIndexBuilder::new(layout, config)?,
            tokenizer,
            next_doc: 0,
            vocabulary: FxHashMap::default(),
            document_frequency: Vec::new(),
            doc_vectors: Vec::new(),
            failed: false,
        })
    }

    /// Documents indexed so far
    pub fn document_count(&self) -> usize {
        self.next_doc as usize
    }

    /// Distinct terms indexed so far, in no particular order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.vocabulary.keys().map(String::as_str)
    }

    /// Index `text` as the next document, recorded under `name`
    ///
    /// A failure may leave part of the document in the build, so the indexer
    /// refuses further documents and [`finish`](Self::finish) fails too.
    pub fn index_text(&mut self, name: &str, text: &str) -> Result<DocId> {
        self.ensure_usable()?;
        let result = self.add_document(name, text);
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.failed {
            return Err(Error::Build(
                "indexer stopped after a failed document".into(),
            ));
        }
        Ok(())
    }

    fn add_document(&mut self, name: &str, text: &str) -> Result<DocId> {
        let doc = self.next_doc;
        let mut frequencies: FxHashMap<String, u32> = FxHashMap::default();
        let mut length: u32 = 0;

        for token in self.tokenizer.tokens(text) {
            self.builder.insert(&token, doc, length)?;
            *frequencies.entry(token).or_insert(0) += 1;
            length = length
                .checked_add(1)
                .ok_or_else(|| Error::invalid_input(format!("document {:?} has too many tokens", name)))?;
        }

        let mut vector = Vec::with_capacity(frequencies.len());
        for (term, tf) in frequencies {
            let next_id = self.document_frequency.len() as u32;
            let id = *self.vocabulary.entry(term).or_insert(next_id);
            if id == next_id {
                self.document_frequency.push(0);
            }
            self.document_frequency[id as usize] += 1;
            vector.push((id, tf));
        }
        self.doc_vectors.push(vector);

        self.builder.register_document(Document::new(doc, name, length))?;
        self.next_doc += 1;
        debug!(target: "quarry::indexer", doc, name, length, "Indexed document");
        Ok(doc)
    }

    /// Index a file; invalid UTF-8 is replaced rather than rejected
    pub fn index_file(&mut self, path: &Path) -> Result<DocId> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        self.index_text(&path.to_string_lossy(), &text)
    }

    /// Index every file below `root` in sorted path order
    ///
    /// Files and directories that cannot be read are logged and skipped; any
    /// failure while indexing a file that was read aborts the walk. Returns
    /// the number of documents indexed.
    pub fn index_directory(&mut self, root: &Path) -> Result<usize> {
        let before = self.next_doc;
        let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];

        while let Some(path) = stack.pop() {
            if path.is_dir() {
                let mut children = match fs::read_dir(&path) {
                    Ok(entries) => entries
                        .filter_map(|e| e.ok().map(|e| e.path()))
                        .collect::<Vec<_>>(),
                    Err(e) => {
                        warn!(target: "quarry::indexer", path = %path.display(), error = %e, "Skipping unreadable directory");
                        continue;
                    }
                };
                // Reverse so the stack pops in ascending order
                children.sort_by(|a, b| b.cmp(a));
                stack.extend(children);
            } else {
                let bytes = match fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(target: "quarry::indexer", path = %path.display(), error = %e, "Skipping unreadable file");
                        continue;
                    }
                };
                self.index_text(&path.to_string_lossy(), &String::from_utf8_lossy(&bytes))?;
            }
        }

        let indexed = (self.next_doc - before) as usize;
        info!(target: "quarry::indexer", root = %root.display(), documents = indexed, "Indexed directory");
        Ok(indexed)
    }

    /// Finish the build, write document norms, and open the result
    pub fn finish(self) -> Result<(DiskIndex, BuildReport)> {
        self.ensure_usable()?;
        let Indexer {
            builder,
            document_frequency,
            doc_vectors,
            ..
        } = self;
        let layout = builder.layout().clone();
        let report = builder.finish()?;

        let n = doc_vectors.len() as f64;
        let norms = doc_vectors.iter().enumerate().map(|(doc, vector)| {
            let sum: f64 = vector
                .iter()
                .map(|&(term, tf)| {
                    let idf = (n / document_frequency[term as usize] as f64).ln();
                    let weight = tf as f64 * idf;
                    weight * weight
                })
                .sum();
            (doc as DocId, sum.sqrt())
        });
        write_norms(&layout.norms_path(), norms)?;

        let index = DiskIndex::open(&layout)?;
        Ok((index, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::PostingsSource;
    use tempfile::TempDir;

    #[test]
    fn test_index_text_assigns_dense_ids() {
        let dir = TempDir::new().unwrap();
        let mut indexer = Indexer::new(IndexLayout::new(dir.path()), QuarryConfig::default()).unwrap();
        assert_eq!(indexer.index_text("first", "the cat sat").unwrap(), 0);
        assert_eq!(indexer.index_text("second", "").unwrap(), 1);
        assert_eq!(indexer.document_count(), 2);

        let mut terms: Vec<&str> = indexer.terms().collect();
        terms.sort();
        assert_eq!(terms, vec!["cat", "sat", "the"]);

        let (index, report) = indexer.finish().unwrap();
        assert_eq!(report.documents, 2);
        assert_eq!(index.doc_length(0), Some(3));
        assert_eq!(index.doc_length(1), Some(0));
        let the = index.postings("the").unwrap().unwrap();
        assert_eq!(the.get(0).unwrap().offsets, vec![0]);
    }

    #[test]
    fn test_norms_follow_tf_idf() {
        let dir = TempDir::new().unwrap();
        let mut indexer = Indexer::new(IndexLayout::new(dir.path()), QuarryConfig::default()).unwrap();
        indexer.index_text("d0", "apple apple pear").unwrap();
        indexer.index_text("d1", "pear").unwrap();
        let (index, _) = indexer.finish().unwrap();

        // pear occurs everywhere (idf 0); apple has tf 2, idf ln 2
        let expected = 2.0 * 2f64.ln();
        assert!((index.doc_norm(0).unwrap() - expected).abs() < 1e-12);
        assert_eq!(index.doc_norm(1), Some(0.0));
    }

    #[test]
    fn test_index_directory_sorted() {
        let corpus = TempDir::new().unwrap();
        fs::create_dir(corpus.path().join("sub")).unwrap();
        fs::write(corpus.path().join("b.txt"), "beta").unwrap();
        fs::write(corpus.path().join("a.txt"), "alpha").unwrap();
        fs::write(corpus.path().join("sub").join("c.txt"), "gamma").unwrap();
        fs::write(corpus.path().join("z.bin"), [0xff, 0xfe, b'x']).unwrap();

        let out = TempDir::new().unwrap();
        let mut indexer = Indexer::new(IndexLayout::new(out.path()), QuarryConfig::default()).unwrap();
        assert_eq!(indexer.index_directory(corpus.path()).unwrap(), 4);
        let (index, _) = indexer.finish().unwrap();

        assert!(index.doc_path(0).unwrap().ends_with("a.txt"));
        assert!(index.doc_path(1).unwrap().ends_with("b.txt"));
        assert!(index.doc_path(2).unwrap().ends_with("c.txt"));
        assert_eq!(index.postings("gamma").unwrap().unwrap().doc_ids(), vec![2]);
        assert_eq!(index.postings("x").unwrap().unwrap().doc_ids(), vec![3]);
    }

    #[test]
    fn test_sharded_and_single_builds_agree() {
        // No term repeats within a document, so offsets cannot be split
        // across shards
        let texts = ["red green blue", "green yellow", "blue red", "violet green", "red"];

        let build = |config: QuarryConfig| {
            let dir = TempDir::new().unwrap();
            let mut indexer = Indexer::new(IndexLayout::new(dir.path()), config).unwrap();
            for (i, text) in texts.iter().enumerate() {
                indexer.index_text(&format!("t{}", i), text).unwrap();
            }
            let (index, _) = indexer.finish().unwrap();
            ["red", "green", "blue", "yellow", "violet"]
                .iter()
                .map(|t| index.postings(t).unwrap().unwrap())
                .collect::<Vec<_>>()
        };

        let single = build(QuarryConfig::default());
        let sharded = build(QuarryConfig::for_testing().with_max_terms_per_shard(1));
        assert_eq!(single, sharded);
    }

    #[test]
    fn test_index_side_failure_stops_the_build() {
        let corpus = TempDir::new().unwrap();
        fs::write(corpus.path().join("a.txt"), "p").unwrap();
        fs::write(corpus.path().join("b.txt"), "q r s").unwrap();
        fs::write(corpus.path().join("c.txt"), "t").unwrap();

        let out = TempDir::new().unwrap();
        let layout = IndexLayout::new(out.path());
        let config = QuarryConfig::for_testing().with_max_terms_per_shard(2);
        let mut indexer = Indexer::new(layout.clone(), config).unwrap();

        // The next spill cannot append to docInfo
        fs::remove_file(layout.docinfo_path()).unwrap();
        fs::create_dir(layout.docinfo_path()).unwrap();

        let err = indexer.index_directory(corpus.path()).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "unexpected error: {:?}", err);

        fs::remove_dir(layout.docinfo_path()).unwrap();
        let err = indexer.index_text("d.txt", "u").unwrap_err();
        assert!(matches!(err, Error::Build(_)));
        assert!(matches!(indexer.finish().err().unwrap(), Error::Build(_)));
    }
}
