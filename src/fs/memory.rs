//! In-memory file layer for generated content.
//!
//! Files are stored flat by canonical path. Directories are implicit: a path
//! is a directory exactly when some stored file lives below it. A per-directory
//! file count keeps that question a single lookup.

use chrono::Utc;
use rustc_hash::{FxHashMap, FxHashSet};

use super::stat::{FileKind, PartialStats, StatResult, Timestamp};
use crate::error::{StorageError, StorageResult};
use crate::path::CanonicalPath;

/// A file held in memory.
#[derive(Debug, Clone)]
struct MemoryFile {
    content: Vec<u8>,
    created: Timestamp,
    modified: Timestamp,
}

/// Writable, process-lifetime file layer.
#[derive(Debug, Default, Clone)]
pub struct MemoryLayer {
    files: FxHashMap<CanonicalPath, MemoryFile>,
    /// Number of stored files below each implicit directory.
    dirs: FxHashMap<CanonicalPath, usize>,
}

impl MemoryLayer {
    /// Create an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a file is stored at `path`.
    #[inline]
    pub fn is_file(&self, path: &CanonicalPath) -> bool {
        self.files.contains_key(path)
    }

    /// Whether any stored file lives below `path`.
    #[inline]
    pub fn is_directory(&self, path: &CanonicalPath) -> bool {
        self.dirs.contains_key(path)
    }

    /// Whether the layer has any opinion about `path`.
    #[inline]
    pub fn exists(&self, path: &CanonicalPath) -> bool {
        self.is_file(path) || self.is_directory(path)
    }

    /// Read a stored file.
    pub fn read(&self, path: &CanonicalPath) -> StorageResult<&[u8]> {
        match self.files.get(path) {
            Some(file) => Ok(&file.content),
            None if self.is_directory(path) => Err(StorageError::IsDirectory(path.clone())),
            None => Err(StorageError::NotFound(path.clone())),
        }
    }

    /// Store `content` at `path`, replacing any previous file.
    ///
    /// Fails if `path` is an implicit directory, or if one of its ancestors is
    /// a stored file.
    pub fn write(&mut self, path: &CanonicalPath, content: Vec<u8>) -> StorageResult<()> {
        if path.is_root() || self.is_directory(path) {
            return Err(StorageError::IsDirectory(path.clone()));
        }
        let mut ancestor = path.parent();
        while let Some(dir) = ancestor {
            if self.files.contains_key(&dir) {
                return Err(StorageError::NotADirectory(dir));
            }
            ancestor = dir.parent();
        }

        let now = Utc::now();
        match self.files.get_mut(path) {
            Some(file) => {
                file.content = content;
                file.modified = now;
            }
            None => {
                let file = MemoryFile {
                    content,
                    created: now,
                    modified: now,
                };
                self.files.insert(path.clone(), file);
                self.link(path);
            }
        }
        Ok(())
    }

    /// Remove the file at `path`, or every file below it if it is a directory.
    ///
    /// Returns `true` if anything was removed.
    pub fn delete(&mut self, path: &CanonicalPath) -> bool {
        if self.files.remove(path).is_some() {
            self.unlink(path);
            return true;
        }
        if !self.is_directory(path) {
            return false;
        }
        let doomed: Vec<_> = self
            .files
            .keys()
            .filter(|file| file.strip_dir(path).is_some())
            .cloned()
            .collect();
        for file in &doomed {
            self.files.remove(file);
            self.unlink(file);
        }
        true
    }

    /// Names of the direct children of a directory.
    pub fn list(&self, path: &CanonicalPath) -> StorageResult<Vec<String>> {
        if self.files.contains_key(path) {
            return Err(StorageError::NotADirectory(path.clone()));
        }
        if !self.is_directory(path) {
            return Err(StorageError::NotFound(path.clone()));
        }
        let mut seen = FxHashSet::default();
        let mut names = Vec::new();
        for file in self.files.keys() {
            if let Some(rest) = file.strip_dir(path) {
                let name = rest.split('/').next().unwrap_or(rest);
                if seen.insert(name) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Partial metadata for a stored file or implicit directory.
    ///
    /// Directories take their timestamps from the newest file below them.
    pub fn stat(&self, path: &CanonicalPath) -> StorageResult<StatResult> {
        if let Some(file) = self.files.get(path) {
            let mut stats =
                PartialStats::new(FileKind::File, file.content.len() as u64, file.modified);
            stats.birthtime = file.created;
            return Ok(StatResult::Synthesized(stats));
        }
        if !self.is_directory(path) {
            return Err(StorageError::NotFound(path.clone()));
        }

        self.files
            .iter()
            .filter(|(file, _)| file.strip_dir(path).is_some())
            .map(|(_, file)| file.modified)
            .max()
            .map(|newest| StatResult::Synthesized(PartialStats::new(FileKind::Directory, 0, newest)))
            .ok_or_else(|| StorageError::NotFound(path.clone()))
    }

    /// Iterate over all stored file paths.
    pub fn paths(&self) -> impl Iterator<Item = &CanonicalPath> {
        self.files.keys()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no files are stored.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn link(&mut self, file: &CanonicalPath) {
        let mut ancestor = file.parent();
        while let Some(dir) = ancestor {
            ancestor = dir.parent();
            *self.dirs.entry(dir).or_default() += 1;
        }
    }

    fn unlink(&mut self, file: &CanonicalPath) {
        let mut ancestor = file.parent();
        while let Some(dir) = ancestor {
            ancestor = dir.parent();
            if let Some(count) = self.dirs.get_mut(&dir) {
                *count -= 1;
                if *count == 0 {
                    self.dirs.remove(&dir);
                }
            }
        }
    }
}
