//! One partition of the index: dictionary, data store, and the in-memory
//! accumulator that feeds them
//!
//! During a build postings are collected in an [`Accumulator`]. A flush
//! writes every accumulated term as a blob to the data store and a record to
//! the dictionary, then empties the accumulator. Lookups go dictionary first,
//! then verify the term stored in the blob so that probe collisions are never
//! mistaken for hits.

use crate::data::{BlobScanner, DataStore};
use crate::dictionary::{DictionaryRecord, DiskDictionary};
use crate::layout::{IndexLayout, Partition};
use quarry_core::postings::{encode_blob, split_blob, validate_term};
use quarry_core::{DocId, Error, PostingsEntry, PostingsList, Result};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

// ============================================================================
// Accumulator
// ============================================================================

/// In-memory postings for the terms seen since the last flush
#[derive(Debug, Default)]
pub struct Accumulator {
    terms: FxHashMap<String, PostingsList>,
}

impl Accumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct terms held
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True if no term is held
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Postings held for a term
    pub fn get(&self, term: &str) -> Option<&PostingsList> {
        self.terms.get(term)
    }

    /// Record one occurrence of `term` in `doc` at token `offset`
    ///
    /// Documents must arrive in non-decreasing docID order per term; repeated
    /// occurrences in the same document append an offset.
    pub fn insert(&mut self, term: &str, doc: DocId, offset: u32) -> Result<()> {
        if let Some(list) = self.terms.get_mut(term) {
            match list.last_mut() {
                Some(last) if last.doc_id == doc => {
                    last.add_offset(offset);
                    return Ok(());
                }
                Some(last) if last.doc_id > doc => {
                    return Err(Error::OrderViolation {
                        term: term.to_string(),
                        last: last.doc_id,
                        got: doc,
                    });
                }
                _ => {}
            }
            list.push(PostingsEntry::with_offset(doc, offset));
            return Ok(());
        }

        validate_term(term)?;
        let mut list = PostingsList::new();
        list.push(PostingsEntry::with_offset(doc, offset));
        self.terms.insert(term.to_string(), list);
        Ok(())
    }

    /// Move the contents out, leaving this accumulator empty
    pub fn take(&mut self) -> Accumulator {
        std::mem::take(self)
    }

    /// Terms in ascending order, so flushed files are reproducible
    pub fn into_sorted(self) -> Vec<(String, PostingsList)> {
        let mut terms: Vec<_> = self.terms.into_iter().collect();
        terms.sort_by(|a, b| a.0.cmp(&b.0));
        terms
    }

    /// Iterate over the held terms in no particular order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }
}

// ============================================================================
// PartitionIndex
// ============================================================================

/// Counters reported by a flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Terms written
    pub terms: usize,
    /// Occupied slots skipped while placing them
    pub collisions: u64,
    /// Bytes appended to the data store
    pub bytes: u64,
}

/// Dictionary and data store of one partition
pub struct PartitionIndex {
    partition: Partition,
    dictionary: DiskDictionary,
    data: DataStore,
    accumulator: Accumulator,
}

impl PartitionIndex {
    /// Create empty files for `partition`, truncating any existing ones
    pub fn create(layout: &IndexLayout, partition: Partition, table_size: u64) -> Result<Self> {
        let dictionary = DiskDictionary::create(layout.dictionary_path(partition), table_size)?;
        let data = DataStore::create(layout.data_path(partition))?;
        debug!(target: "quarry::storage", %partition, table_size, "Created partition");
        Ok(PartitionIndex {
            partition,
            dictionary,
            data,
            accumulator: Accumulator::new(),
        })
    }

    /// Open the files of an existing partition read-only
    pub fn open(layout: &IndexLayout, partition: Partition) -> Result<Self> {
        let dictionary = DiskDictionary::open(layout.dictionary_path(partition))?;
        let data = DataStore::open(layout.data_path(partition))?;
        Ok(PartitionIndex {
            partition,
            dictionary,
            data,
            accumulator: Accumulator::new(),
        })
    }

    /// Replace the in-memory accumulator
    pub fn with_accumulator(mut self, accumulator: Accumulator) -> Self {
        self.accumulator = accumulator;
        self
    }

    /// Which partition this is
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Slot count of the dictionary
    pub fn table_size(&self) -> u64 {
        self.dictionary.table_size()
    }

    /// Terms written through this handle
    pub fn term_count(&self) -> u64 {
        self.dictionary.occupied()
    }

    /// Bytes in the data store
    pub fn data_len(&self) -> u64 {
        self.data.len()
    }

    /// Record one occurrence in the accumulator
    pub fn insert(&mut self, term: &str, doc: DocId, offset: u32) -> Result<()> {
        self.accumulator.insert(term, doc, offset)
    }

    /// Distinct terms waiting for the next flush
    pub fn accumulated_terms(&self) -> usize {
        self.accumulator.len()
    }

    /// Write every accumulated term to disk and clear the accumulator
    pub fn flush(&mut self) -> Result<FlushStats> {
        let accumulator = self.accumulator.take();
        let start = self.data.len();
        let mut stats = FlushStats::default();

        for (term, postings) in accumulator.into_sorted() {
            stats.collisions += self.append_blob(&term, &encode_blob(&term, &postings))?;
            stats.terms += 1;
        }
        stats.bytes = self.data.len() - start;
        self.sync()?;

        info!(
            target: "quarry::storage",
            partition = %self.partition,
            terms = stats.terms,
            collisions = stats.collisions,
            bytes = stats.bytes,
            "Flushed partition"
        );
        Ok(stats)
    }

    /// Append an already encoded blob for `term` and index it
    ///
    /// Returns the collisions met while placing the dictionary record.
    pub fn append_blob(&mut self, term: &str, blob: &str) -> Result<u64> {
        self.dictionary.check_capacity()?;
        let size = u32::try_from(blob.len()).map_err(|_| {
            Error::invalid_input(format!(
                "postings blob for {:?} is {} bytes, above the 4 GiB record limit",
                term,
                blob.len()
            ))
        })?;
        let pointer = self.data.append(blob.as_bytes())?;
        self.dictionary
            .insert(term, DictionaryRecord::new(pointer, size))
    }

    /// Raw blob stored for `term`
    pub fn lookup_blob(&mut self, term: &str) -> Result<Option<String>> {
        let data = &mut self.data;
        let mut found = None;
        self.dictionary.lookup(term, |record| {
            let blob = data.read_blob(record)?;
            let matches = split_blob(&blob)?.0 == term;
            if matches {
                found = Some(blob);
            }
            Ok(matches)
        })?;
        Ok(found)
    }

    /// Decoded postings for `term`; `Ok(None)` if the term is absent
    pub fn postings(&mut self, term: &str) -> Result<Option<PostingsList>> {
        match self.lookup_blob(term)? {
            Some(blob) => {
                let (_, encoded) = split_blob(&blob)?;
                Ok(Some(encoded.parse()?))
            }
            None => Ok(None),
        }
    }

    /// Iterate over every stored blob in data-file order
    pub fn scan(&self) -> Result<BlobScanner> {
        self.data.scan()
    }

    /// Flush both files to stable storage
    pub fn sync(&self) -> Result<()> {
        self.data.sync()?;
        self.dictionary.sync()
    }
}

// ============================================================================
// Tests
// ============================================================================
