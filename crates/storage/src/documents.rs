//! Per-document metadata
//!
//! `docInfo` holds one line per document, `docID;path;length`. The path is
//! everything between the first and the last `;`, so paths may themselves
//! contain semicolons. `norms` holds one line per document, `docID norm`,
//! written once the whole corpus has been indexed.

use crate::layout::IndexLayout;
use quarry_core::{DocId, Document, Error, Result};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ============================================================================
// DocumentStore
// ============================================================================

/// Document metadata and norms loaded in memory
#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    docs: BTreeMap<DocId, Document>,
    norms: FxHashMap<DocId, f64>,
}

impl DocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `docInfo` and `norms` from an index directory
    ///
    /// Either file may be missing, which yields no entries for it.
    pub fn load(layout: &IndexLayout) -> Result<Self> {
        let mut store = DocumentStore::new();
        for doc in read_docinfo(&layout.docinfo_path())? {
            store.insert(doc);
        }
        store.norms = read_norms(&layout.norms_path())?;
        debug!(
            target: "quarry::storage",
            docs = store.docs.len(),
            norms = store.norms.len(),
            "Loaded document metadata"
        );
        Ok(store)
    }

    /// Add or replace a document record
    pub fn insert(&mut self, doc: Document) {
        self.docs.insert(doc.id, doc);
    }

    /// Set the norm of a document
    pub fn set_norm(&mut self, doc: DocId, norm: f64) {
        self.norms.insert(doc, norm);
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// True if no document is known
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Record of a document
    pub fn get(&self, doc: DocId) -> Option<&Document> {
        self.docs.get(&doc)
    }

    /// Token count of a document
    pub fn length(&self, doc: DocId) -> Option<u32> {
        self.docs.get(&doc).map(|d| d.length)
    }

    /// Path of a document
    pub fn path(&self, doc: DocId) -> Option<&str> {
        self.docs.get(&doc).map(|d| d.path.as_str())
    }

    /// Norm of a document, if computed
    pub fn norm(&self, doc: DocId) -> Option<f64> {
        self.norms.get(&doc).copied()
    }

    /// Documents in docID order
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.values()
    }
}

fn parse_docinfo_line(line: &str) -> Result<Document> {
    let bad = || Error::corruption(format!("malformed docInfo line: {:?}", line));
    let (id, rest) = line.split_once(';').ok_or_else(bad)?;
    let (path, length) = rest.rsplit_once(';').ok_or_else(bad)?;
    let id = id.trim().parse().map_err(|_| bad())?;
    let length = length.trim().parse().map_err(|_| bad())?;
    Ok(Document::new(id, path, length))
}

/// Read every record of a `docInfo` file; a missing file reads as empty
pub fn read_docinfo(path: &Path) -> Result<Vec<Document>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut docs = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        docs.push(parse_docinfo_line(&line)?);
    }
    Ok(docs)
}

/// Read a `norms` file; a missing file reads as empty
pub fn read_norms(path: &Path) -> Result<FxHashMap<DocId, f64>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FxHashMap::default()),
        Err(e) => return Err(e.into()),
    };
    let mut norms = FxHashMap::default();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let (Some(doc), Some(norm)) = (fields.next(), fields.next()) else {
            if !line.trim().is_empty() {
                warn!(target: "quarry::storage", line = %line, "Skipping malformed norm line");
            }
            continue;
        };
        let doc: DocId = doc
            .parse()
            .map_err(|_| Error::corruption(format!("malformed norm line: {:?}", line)))?;
        let norm: f64 = norm
            .parse()
            .map_err(|_| Error::corruption(format!("malformed norm line: {:?}", line)))?;
        norms.insert(doc, norm);
    }
    Ok(norms)
}

/// Write a `norms` file, replacing any previous one
pub fn write_norms<I>(path: &Path, norms: I) -> Result<()>
where
    I: IntoIterator<Item = (DocId, f64)>,
{
    let mut out = BufWriter::new(File::create(path)?);
    for (doc, norm) in norms {
        writeln!(out, "{} {}", doc, norm)?;
    }
    out.flush()?;
    out.get_ref().sync_all()?;
    Ok(())
}

// ============================================================================
// DocumentLog
// ============================================================================

/// Appends document records to `docInfo` as the build progresses
///
/// Records are buffered until [`DocumentLog::append_pending`]; a watermark
/// makes repeated calls write each document exactly once.
pub struct DocumentLog {
    path: PathBuf,
    pending: Vec<Document>,
    last_registered: Option<DocId>,
    watermark: Option<DocId>,
}

impl DocumentLog {
    /// Start a fresh `docInfo` file, truncating any existing one
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        File::create(&path)?;
        Ok(DocumentLog {
            path,
            pending: Vec::new(),
            last_registered: None,
            watermark: None,
        })
    }

    /// Buffer a document record
    pub fn register(&mut self, doc: Document) -> Result<()> {
        if let Some(last) = self.last_registered {
            if doc.id <= last {
                return Err(Error::invalid_input(format!(
                    "document id {} registered after {}",
                    doc.id, last
                )));
            }
        }
        if doc.path.contains(['\n', '\r']) {
            return Err(Error::invalid_input(format!(
                "document path {:?} contains a line break",
                doc.path
            )));
        }
        self.last_registered = Some(doc.id);
        self.pending.push(doc);
        Ok(())
    }

    /// Write buffered records above the watermark; returns how many were written
    ///
    /// Records stay buffered when the write fails.
    pub fn append_pending(&mut self) -> Result<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let mut lines = String::new();
        let mut written = 0;
        let mut last = self.watermark;
        for doc in &self.pending {
            if last.map_or(false, |w| doc.id <= w) {
                continue;
            }
            lines.push_str(&format!("{};{};{}\n", doc.id, doc.path, doc.length));
            last = Some(doc.id);
            written += 1;
        }

        let mut file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        file.write_all(lines.as_bytes())?;
        file.flush()?;

        self.pending.clear();
        self.watermark = last;
        Ok(written)
    }

    /// Highest docID written so far
    pub fn watermark(&self) -> Option<DocId> {
        self.watermark
    }

    /// File being appended to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Remove a metadata file if present
pub fn remove_file_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
