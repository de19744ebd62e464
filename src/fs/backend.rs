//! Persistent-storage delegate.
//!
//! The overlay never writes through this trait; it only probes, reads and
//! lists. Every method may fail independently and the overlay treats any
//! failure as "does not exist".

use std::fs;
use std::io;
use std::path::PathBuf;

use super::stat::{Metadata, StatResult};
use crate::error::{StorageError, StorageResult};
use crate::path::{CanonicalPath, PathResolver, PathStyle};

/// Read-only access to durable storage.
pub trait PersistentBackend {
    /// Whether `path` is a regular file.
    fn is_file(&self, path: &CanonicalPath) -> StorageResult<bool>;

    /// Whether `path` is a directory.
    fn is_directory(&self, path: &CanonicalPath) -> StorageResult<bool>;

    /// Read the full content of a file.
    fn read(&self, path: &CanonicalPath) -> StorageResult<Vec<u8>>;

    /// List the entry names of a directory.
    fn list(&self, path: &CanonicalPath) -> StorageResult<Vec<String>>;

    /// Metadata for an entry.
    fn stat(&self, path: &CanonicalPath) -> StorageResult<StatResult>;
}

impl<B: PersistentBackend + ?Sized> PersistentBackend for Box<B> {
    fn is_file(&self, path: &CanonicalPath) -> StorageResult<bool> {
        (**self).is_file(path)
    }

    fn is_directory(&self, path: &CanonicalPath) -> StorageResult<bool> {
        (**self).is_directory(path)
    }

    fn read(&self, path: &CanonicalPath) -> StorageResult<Vec<u8>> {
        (**self).read(path)
    }

    fn list(&self, path: &CanonicalPath) -> StorageResult<Vec<String>> {
        (**self).list(path)
    }

    fn stat(&self, path: &CanonicalPath) -> StorageResult<StatResult> {
        (**self).stat(path)
    }
}

// =============================================================================
// DiskBackend
// =============================================================================

/// Backend over the local filesystem via `std::fs`.
#[derive(Debug, Clone)]
pub struct DiskBackend {
    resolver: PathResolver,
}

impl DiskBackend {
    /// Create a backend using the platform's native path convention.
    pub fn new() -> Self {
        Self::with_style(PathStyle::native())
    }

    /// Create a backend with an explicit path convention.
    pub fn with_style(style: PathStyle) -> Self {
        Self {
            resolver: PathResolver::with_style("/", style),
        }
    }

    fn native(&self, path: &CanonicalPath) -> PathBuf {
        PathBuf::from(self.resolver.denormalize(path))
    }

    fn metadata(&self, path: &CanonicalPath) -> StorageResult<fs::Metadata> {
        fs::metadata(self.native(path)).map_err(|e| StorageError::from_io(e, path))
    }
}

impl Default for DiskBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistentBackend for DiskBackend {
    fn is_file(&self, path: &CanonicalPath) -> StorageResult<bool> {
        match self.metadata(path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn is_directory(&self, path: &CanonicalPath) -> StorageResult<bool> {
        match self.metadata(path) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn read(&self, path: &CanonicalPath) -> StorageResult<Vec<u8>> {
        if self.metadata(path)?.is_dir() {
            return Err(StorageError::IsDirectory(path.clone()));
        }
        fs::read(self.native(path)).map_err(|e| StorageError::from_io(e, path))
    }

    fn list(&self, path: &CanonicalPath) -> StorageResult<Vec<String>> {
        let entries = fs::read_dir(self.native(path)).map_err(|e| StorageError::from_io(e, path))?;
        Ok(entry_names(entries, |entry| {
            entry.file_name().to_string_lossy().into_owned()
        }))
    }

    fn stat(&self, path: &CanonicalPath) -> StorageResult<StatResult> {
        self.metadata(path).map(|meta| Metadata::from_std(&meta))
    }
}

/// Names of the readable entries; an entry that fails to read drops out
/// without losing the rest of the listing.
fn entry_names<E>(
    entries: impl Iterator<Item = io::Result<E>>,
    name: impl Fn(E) -> String,
) -> Vec<String> {
    entries.filter_map(Result::ok).map(name).collect()
}
