//! Index directory layout
//!
//! Every index lives in one directory:
//!
//! ```text
//! <root>/
//!   dictionary        canonical dictionary
//!   data              canonical data store
//!   dictionary<N>     dictionary of intermediate shard N
//!   data<N>           data store of intermediate shard N
//!   docInfo           per-document metadata, one line per document
//!   norms             per-document vector norms
//! ```

use quarry_core::{Result, ShardId};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Canonical dictionary file name
pub const DICTIONARY_FNAME: &str = "dictionary";
/// Canonical data file name
pub const DATA_FNAME: &str = "data";
/// Document metadata file name
pub const DOCINFO_FNAME: &str = "docInfo";
/// Document norm file name
pub const NORMS_FNAME: &str = "norms";

/// One dictionary + data file pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// The final, queryable index
    Canonical,
    /// An intermediate shard produced during a build
    Shard(ShardId),
}

impl Partition {
    fn suffix(&self) -> String {
        match self {
            Partition::Canonical => String::new(),
            Partition::Shard(id) => id.to_string(),
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Partition::Canonical => write!(f, "canonical"),
            Partition::Shard(id) => write!(f, "shard {}", id),
        }
    }
}

/// Paths of the files that make up an index directory
#[derive(Debug, Clone)]
pub struct IndexLayout {
    root: PathBuf,
}

impl IndexLayout {
    /// Use `root` as index directory without touching the filesystem
    pub fn new(root: impl Into<PathBuf>) -> Self {
        IndexLayout { root: root.into() }
    }

    /// Use `root` as index directory, creating it if needed
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let layout = IndexLayout::new(root);
        fs::create_dir_all(&layout.root)?;
        Ok(layout)
    }

    /// Index directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Dictionary file of a partition
    pub fn dictionary_path(&self, partition: Partition) -> PathBuf {
        self.root
            .join(format!("{}{}", DICTIONARY_FNAME, partition.suffix()))
    }

    /// Data file of a partition
    pub fn data_path(&self, partition: Partition) -> PathBuf {
        self.root.join(format!("{}{}", DATA_FNAME, partition.suffix()))
    }

    /// Document metadata file
    pub fn docinfo_path(&self) -> PathBuf {
        self.root.join(DOCINFO_FNAME)
    }

    /// Document norm file
    pub fn norms_path(&self) -> PathBuf {
        self.root.join(NORMS_FNAME)
    }

    /// True if both files of the partition exist
    pub fn exists(&self, partition: Partition) -> bool {
        self.dictionary_path(partition).is_file() && self.data_path(partition).is_file()
    }

    /// Delete both files of a partition; missing files are ignored
    pub fn remove(&self, partition: Partition) -> Result<()> {
        remove_if_present(&self.dictionary_path(partition))?;
        remove_if_present(&self.data_path(partition))?;
        debug!(target: "quarry::storage", %partition, "Removed partition files");
        Ok(())
    }

    /// Promote a finished shard to the canonical partition
    ///
    /// Any previous canonical files are replaced. The directory is synced so
    /// the renames survive a crash.
    pub fn install(&self, shard: ShardId) -> Result<()> {
        let from = Partition::Shard(shard);
        self.remove(Partition::Canonical)?;
        fs::rename(
            self.dictionary_path(from),
            self.dictionary_path(Partition::Canonical),
        )?;
        fs::rename(self.data_path(from), self.data_path(Partition::Canonical))?;
        self.sync_dir()?;
        info!(target: "quarry::storage", shard, "Installed shard as canonical index");
        Ok(())
    }

    /// Flush directory entries to stable storage
    pub fn sync_dir(&self) -> Result<()> {
        // Directories cannot be opened as files on every platform
        if let Ok(dir) = File::open(&self.root) {
            dir.sync_all()?;
        }
        Ok(())
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
