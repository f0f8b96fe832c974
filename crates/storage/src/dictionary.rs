//! On-disk dictionary hash table
//!
//! A fixed number of 12-byte slots, addressed by `hash(term) mod table_size`
//! and resolved by forward linear probing with wrap-around. The dictionary
//! never sees terms themselves: callers supply a matcher that checks the data
//! blob a record points at.
//!
//! # Record Format
//!
//! ```text
//! +--------------------------+
//! | flag | pointer (63 bits) | 8 bytes (u64 BE), top bit = occupied
//! | size                     | 4 bytes (u32 BE)
//! +--------------------------+
//! ```
//!
//! An all-zero record is an empty slot. Because occupied records always carry
//! the flag bit, a record pointing at offset 0 with size 0 stays
//! distinguishable from an empty slot.
//!
//! # Capacity
//!
//! Probing terminates only while at least one slot is empty, so inserts are
//! refused once the table would be full, and every probe sequence is bounded
//! by `table_size` reads regardless.

use byteorder::{BigEndian, ByteOrder};
use quarry_core::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Width of one dictionary slot in bytes
pub const RECORD_SIZE: u64 = 12;

/// Flag marking a slot as occupied
const OCCUPIED: u64 = 1 << 63;

/// Map a term to its home slot
pub fn slot_for(term: &str, table_size: u64) -> u64 {
    xxhash_rust::xxh3::xxh3_64(term.as_bytes()) % table_size
}

// ============================================================================
// DictionaryRecord
// ============================================================================

/// Location of one blob in the data store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictionaryRecord {
    /// Byte offset of the blob in the data file
    pub pointer: u64,
    /// Length of the blob in bytes
    pub size: u32,
}

impl DictionaryRecord {
    /// Create a record; `pointer` must stay below 2^63
    pub fn new(pointer: u64, size: u32) -> Self {
        debug_assert!(pointer & OCCUPIED == 0, "pointer collides with occupied flag");
        DictionaryRecord { pointer, size }
    }

    /// Serialize to the fixed 12-byte slot form
    pub fn encode(&self) -> [u8; RECORD_SIZE as usize] {
        let mut buf = [0u8; RECORD_SIZE as usize];
        BigEndian::write_u64(&mut buf[0..8], self.pointer | OCCUPIED);
        BigEndian::write_u32(&mut buf[8..12], self.size);
        buf
    }

    /// Deserialize a slot; `Ok(None)` is an empty slot
    pub fn decode(buf: &[u8]) -> Result<Option<Self>> {
        if buf.len() != RECORD_SIZE as usize {
            return Err(Error::corruption(format!(
                "dictionary record is {} bytes, expected {}",
                buf.len(),
                RECORD_SIZE
            )));
        }
        let raw = BigEndian::read_u64(&buf[0..8]);
        let size = BigEndian::read_u32(&buf[8..12]);
        if raw == 0 && size == 0 {
            return Ok(None);
        }
        if raw & OCCUPIED == 0 {
            return Err(Error::corruption(format!(
                "dictionary slot without occupied flag (pointer {}, size {})",
                raw, size
            )));
        }
        Ok(Some(DictionaryRecord {
            pointer: raw & !OCCUPIED,
            size,
        }))
    }
}

// ============================================================================
// DiskDictionary
// ============================================================================

/// Outcome of a dictionary lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    /// Matching record, if any
    pub record: Option<DictionaryRecord>,
    /// Number of slots read
    pub probes: u64,
}

/// Fixed-slot hash table stored in a file
#[derive(Debug)]
pub struct DiskDictionary {
    path: PathBuf,
    file: File,
    table_size: u64,
    occupied: u64,
    writable: bool,
}

impl DiskDictionary {
    /// Create (or truncate) a dictionary file with `table_size` empty slots
    pub fn create(path: impl AsRef<Path>, table_size: u64) -> Result<Self> {
        if table_size < 2 {
            return Err(Error::invalid_input(format!(
                "dictionary table size must be at least 2, got {}",
                table_size
            )));
        }
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.set_len(table_size * RECORD_SIZE)?;
        debug!(path = %path.display(), table_size, "Created dictionary");

        Ok(DiskDictionary {
            path,
            file,
            table_size,
            occupied: 0,
            writable: true,
        })
    }

    /// Open an existing dictionary read-only
    ///
    /// The table size is recovered from the file length.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        if len == 0 || len % RECORD_SIZE != 0 {
            return Err(Error::corruption(format!(
                "dictionary {} has length {}, not a positive multiple of {}",
                path.display(),
                len,
                RECORD_SIZE
            )));
        }

        Ok(DiskDictionary {
            path,
            file,
            table_size: len / RECORD_SIZE,
            occupied: 0,
            writable: false,
        })
    }

    /// Number of slots
    pub fn table_size(&self) -> u64 {
        self.table_size
    }

    /// Records inserted through this handle
    pub fn occupied(&self) -> u64 {
        self.occupied
    }

    /// File backing this dictionary
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fail if one more term would leave no empty slot
    pub fn check_capacity(&self) -> Result<()> {
        if self.occupied + 1 >= self.table_size {
            return Err(Error::CapacityExceeded {
                table_size: self.table_size,
                terms: self.occupied + 1,
            });
        }
        Ok(())
    }

    /// Store `record` in the first empty slot at or after the term's home slot
    ///
    /// Returns the number of occupied slots skipped (collisions).
    pub fn insert(&mut self, term: &str, record: DictionaryRecord) -> Result<u64> {
        if !self.writable {
            return Err(Error::invalid_input(format!(
                "dictionary {} is read-only",
                self.path.display()
            )));
        }
        self.check_capacity()?;

        let mut slot = slot_for(term, self.table_size);
        let mut collisions = 0;
        for _ in 0..self.table_size {
            if self.read_slot(slot)?.is_none() {
                self.write_slot(slot, &record)?;
                self.occupied += 1;
                return Ok(collisions);
            }
            collisions += 1;
            slot = self.next_slot(slot);
        }

        Err(Error::CapacityExceeded {
            table_size: self.table_size,
            terms: self.table_size + 1,
        })
    }

    /// Probe from the term's home slot until `is_match` accepts a record or an
    /// empty slot ends the chain
    pub fn lookup<F>(&mut self, term: &str, mut is_match: F) -> Result<Lookup>
    where
        F: FnMut(&DictionaryRecord) -> Result<bool>,
    {
        let mut slot = slot_for(term, self.table_size);
        let mut probes = 0;
        for _ in 0..self.table_size {
            probes += 1;
            match self.read_slot(slot)? {
                None => break,
                Some(record) => {
                    if is_match(&record)? {
                        return Ok(Lookup {
                            record: Some(record),
                            probes,
                        });
                    }
                }
            }
            slot = self.next_slot(slot);
        }

        Ok(Lookup {
            record: None,
            probes,
        })
    }

    /// Flush file contents to stable storage
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn next_slot(&self, slot: u64) -> u64 {
        (slot + 1) % self.table_size
    }

    fn read_slot(&mut self, slot: u64) -> Result<Option<DictionaryRecord>> {
        let mut buf = [0u8; RECORD_SIZE as usize];
        self.file.seek(SeekFrom::Start(slot * RECORD_SIZE))?;
        self.file.read_exact(&mut buf)?;
        DictionaryRecord::decode(&buf)
    }

    fn write_slot(&mut self, slot: u64, record: &DictionaryRecord) -> Result<()> {
        self.file.seek(SeekFrom::Start(slot * RECORD_SIZE))?;
        self.file.write_all(&record.encode())?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
