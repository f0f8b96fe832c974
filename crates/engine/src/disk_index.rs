//! Read-only access to an installed index

use parking_lot::Mutex;
use quarry_core::{DocId, PostingsList, PostingsSource, Result};
use quarry_storage::{DocumentStore, IndexLayout, Partition, PartitionIndex};
use tracing::info;

/// The canonical partition of an index directory plus its document metadata
///
/// Lookups seek in shared file handles, so they are serialized internally;
/// the index can be shared across threads.
pub struct DiskIndex {
    layout: IndexLayout,
    partition: Mutex<PartitionIndex>,
    documents: DocumentStore,
}

impl DiskIndex {
    /// Open the canonical dictionary, data, `docInfo` and `norms` files
    pub fn open(layout: &IndexLayout) -> Result<Self> {
        let partition = PartitionIndex::open(layout, Partition::Canonical)?;
        let documents = DocumentStore::load(layout)?;
        info!(
            target: "quarry::index",
            root = %layout.root().display(),
            table_size = partition.table_size(),
            documents = documents.len(),
            "Opened index"
        );
        Ok(DiskIndex {
            layout: layout.clone(),
            partition: Mutex::new(partition),
            documents,
        })
    }

    /// Directory of this index
    pub fn layout(&self) -> &IndexLayout {
        &self.layout
    }

    /// Document metadata and norms
    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Dictionary slots of the canonical partition
    pub fn table_size(&self) -> u64 {
        self.partition.lock().table_size()
    }
}

impl PostingsSource for DiskIndex {
    fn postings(&self, term: &str) -> Result<Option<PostingsList>> {
        self.partition.lock().postings(term)
    }

    fn doc_count(&self) -> usize {
        self.documents.len()
    }

    fn doc_length(&self, doc: DocId) -> Option<u32> {
        self.documents.length(doc)
    }

    fn doc_norm(&self, doc: DocId) -> Option<f64> {
        self.documents.norm(doc)
    }

    fn doc_path(&self, doc: DocId) -> Option<&str> {
        self.documents.path(doc)
    }
}
