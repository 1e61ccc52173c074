//! Read-only file access used by the module locator.

use std::cell::Cell;
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

/// Bytes of one module file plus the identifier they were read under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryBuffer {
    identifier: String,
    bytes: Vec<u8>,
}

impl MemoryBuffer {
    pub fn new(identifier: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        MemoryBuffer {
            identifier: identifier.into(),
            bytes: bytes.into(),
        }
    }

    /// Path or name the buffer came from; used as the module's debug path.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Source of module file bytes.
pub trait FileSystem {
    /// Read the whole file at `path`.
    fn read(&self, path: &Path) -> io::Result<MemoryBuffer>;
}

/// The host filesystem.
#[derive(Copy, Clone, Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> io::Result<MemoryBuffer> {
        let bytes = std::fs::read(path)?;
        Ok(MemoryBuffer::new(path.display().to_string(), bytes))
    }
}

/// In-memory filesystem for embedding and tests.
///
/// Counts every read so callers can check how often the locator hit the disk.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: FxHashMap<PathBuf, Vec<u8>>,
    errors: FxHashMap<PathBuf, io::ErrorKind>,
    reads: Cell<usize>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Make reads of `path` fail with `kind`.
    #[must_use]
    pub fn with_error(mut self, path: impl Into<PathBuf>, kind: io::ErrorKind) -> Self {
        self.errors.insert(path.into(), kind);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    /// Stop failing reads of `path`.
    pub fn clear_error(&mut self, path: &Path) {
        self.errors.remove(path);
    }

    /// Number of `read` calls so far, successful or not.
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read(&self, path: &Path) -> io::Result<MemoryBuffer> {
        self.reads.set(self.reads.get() + 1);
        if let Some(&kind) = self.errors.get(path) {
            return Err(io::Error::from(kind));
        }
        match self.files.get(path) {
            Some(bytes) => Ok(MemoryBuffer::new(path.display().to_string(), bytes.clone())),
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }
}
