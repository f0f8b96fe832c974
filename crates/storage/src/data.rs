//! Append-only data store
//!
//! Holds the serialized blobs (`term<postings\n`) that dictionary records
//! point at. Blobs are never rewritten in place; the free pointer only grows.

use crate::dictionary::DictionaryRecord;
use quarry_core::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Append-only file of blobs
pub struct DataStore {
    path: PathBuf,
    file: File,
    free: u64,
    writable: bool,
}

impl DataStore {
    /// Create (or truncate) a data file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        Ok(DataStore {
            path,
            file,
            free: 0,
            writable: true,
        })
    }

    /// Open an existing data file read-only
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let free = file.metadata()?.len();
        Ok(DataStore {
            path,
            file,
            free,
            writable: false,
        })
    }

    /// File backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written so far (the next append offset)
    pub fn len(&self) -> u64 {
        self.free
    }

    /// True if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.free == 0
    }

    /// Append bytes, returning the offset they were written at
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        if !self.writable {
            return Err(Error::invalid_input(format!(
                "data store {} is read-only",
                self.path.display()
            )));
        }
        let offset = self.free;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        self.free += bytes.len() as u64;
        Ok(offset)
    }

    /// Read `size` bytes at `offset`
    pub fn read(&mut self, offset: u64, size: u32) -> Result<Vec<u8>> {
        let end = offset.checked_add(size as u64);
        if end.map_or(true, |end| end > self.free) {
            return Err(Error::corruption(format!(
                "read of {} bytes at {} runs past end of {} ({} bytes)",
                size,
                offset,
                self.path.display(),
                self.free
            )));
        }
        let mut buf = vec![0u8; size as usize];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read the blob a dictionary record points at
    pub fn read_blob(&mut self, record: &DictionaryRecord) -> Result<String> {
        let bytes = self.read(record.pointer, record.size)?;
        String::from_utf8(bytes).map_err(|e| {
            Error::corruption(format!(
                "blob at {} in {} is not UTF-8: {}",
                record.pointer,
                self.path.display(),
                e
            ))
        })
    }

    /// Iterate over every blob in file order
    pub fn scan(&self) -> Result<BlobScanner> {
        Ok(BlobScanner {
            reader: BufReader::new(File::open(&self.path)?),
            line: String::new(),
        })
    }

    /// Flush file contents to stable storage
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

/// Sequential reader over the blobs of a data file
pub struct BlobScanner {
    reader: BufReader<File>,
    line: String,
}

impl Iterator for BlobScanner {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) if self.line.trim().is_empty() => continue,
                Ok(_) => return Some(Ok(std::mem::take(&mut self.line))),
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    return Some(Err(Error::corruption(format!(
                        "data file is not UTF-8: {}",
                        e
                    ))))
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
