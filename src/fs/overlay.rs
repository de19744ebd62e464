//! Two-layer file system with memory-first precedence.
//!
//! For every operation, if the memory layer has an opinion about a path the
//! persistent layer is not consulted. This lets the build pipeline shadow,
//! mask or fabricate files without touching storage.

use rustc_hash::FxHashSet;

use super::backend::PersistentBackend;
use super::memory::MemoryLayer;
use super::stat::{DeviceId, Metadata};
use crate::error::StorageResult;
use crate::path::CanonicalPath;

/// Optional sink for error messages from operations that must not fail.
pub type OnError<'a> = Option<&'a mut dyn FnMut(&str)>;

/// Deliver an error message to a callback, if one was supplied.
pub(crate) fn report(on_error: OnError<'_>, message: &str) {
    if let Some(callback) = on_error {
        callback(message);
    }
}

/// Persistent storage overlaid with an in-memory layer.
pub struct OverlayFileSystem<B> {
    persistent: B,
    memory: MemoryLayer,
    device: DeviceId,
}

impl<B: PersistentBackend> OverlayFileSystem<B> {
    /// Create an overlay with an empty memory layer.
    ///
    /// `device` is stamped on every synthesized stat result.
    pub fn new(persistent: B, device: DeviceId) -> Self {
        Self {
            persistent,
            memory: MemoryLayer::new(),
            device,
        }
    }

    /// The persistent layer.
    #[inline]
    pub fn persistent(&self) -> &B {
        &self.persistent
    }

    /// The memory layer.
    #[inline]
    pub fn memory(&self) -> &MemoryLayer {
        &self.memory
    }

    /// The device id used for synthesized metadata.
    #[inline]
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Whether `path` is a file.
    ///
    /// With `delegate` off only the memory layer is checked. Persistent-layer
    /// failures count as "no".
    pub fn file_exists(&self, path: &CanonicalPath, delegate: bool) -> bool {
        if self.memory.exists(path) {
            return self.memory.is_file(path);
        }
        delegate && self.persistent.is_file(path).unwrap_or(false)
    }

    /// Whether the persistent layer alone has a file at `path`.
    pub fn persistent_file_exists(&self, path: &CanonicalPath) -> bool {
        self.persistent.is_file(path).unwrap_or(false)
    }

    /// Read a file, memory layer first.
    ///
    /// Any failure, including "is a directory", yields `None`.
    pub fn read(&self, path: &CanonicalPath) -> Option<Vec<u8>> {
        self.try_read(path).ok().flatten()
    }

    /// Read a file, separating "missing" from backend faults.
    ///
    /// Missing files and directories are `Ok(None)`; anything else (permission,
    /// I/O) is returned as an error for the caller to report.
    pub fn try_read(&self, path: &CanonicalPath) -> StorageResult<Option<Vec<u8>>> {
        let result = if self.memory.exists(path) {
            self.memory.read(path).map(<[u8]>::to_vec)
        } else {
            self.persistent.read(path)
        };
        match result {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.is_missing() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store `content` in the memory layer, replacing any previous entry.
    ///
    /// Failures go to `on_error` and are otherwise dropped.
    pub fn write(&mut self, path: &CanonicalPath, content: Vec<u8>, on_error: OnError<'_>) {
        if let Err(e) = self.try_write(path, content) {
            report(on_error, &e.to_string());
        }
    }

    /// Store `content` in the memory layer, returning any failure.
    pub fn try_write(&mut self, path: &CanonicalPath, content: Vec<u8>) -> StorageResult<()> {
        self.memory.write(path, content)
    }

    /// Remove `path` from the memory layer. Storage is never touched.
    pub fn delete(&mut self, path: &CanonicalPath) -> bool {
        self.memory.delete(path)
    }

    /// Whether either layer considers `path` a directory.
    pub fn directory_exists(&self, path: &CanonicalPath) -> bool {
        if self.memory.exists(path) {
            return self.memory.is_directory(path);
        }
        self.persistent.is_directory(path).unwrap_or(false)
    }

    /// Names of child directories visible in either layer, de-duplicated.
    ///
    /// A layer that cannot list `path` contributes nothing.
    pub fn list_directories(&self, path: &CanonicalPath) -> Vec<String> {
        let persistent = self
            .persistent
            .list(path)
            .unwrap_or_default()
            .into_iter()
            .filter(|name| {
                let child = path.join(name);
                !self.memory.is_file(&child)
                    && self.persistent.is_directory(&child).unwrap_or(false)
            });
        let memory = self
            .memory
            .list(path)
            .unwrap_or_default()
            .into_iter()
            .filter(|name| self.memory.is_directory(&path.join(name)));

        let mut seen = FxHashSet::default();
        persistent
            .chain(memory)
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }

    /// Metadata for `path`, memory layer first.
    pub fn stat(&self, path: &CanonicalPath) -> Option<Metadata> {
        let result = if self.memory.exists(path) {
            self.memory.stat(path)
        } else {
            self.persistent.stat(path)
        };
        result.ok().map(|stat| stat.into_metadata(self.device))
    }

    /// Paths of every file in the memory layer.
    pub fn virtual_files(&self) -> Vec<CanonicalPath> {
        self.memory.paths().cloned().collect()
    }

    /// Remove a memory-layer file if present, ignoring directories.
    pub(crate) fn delete_virtual_file(&mut self, path: &CanonicalPath) -> bool {
        self.memory.is_file(path) && self.memory.delete(path)
    }
}

impl<B> std::fmt::Debug for OverlayFileSystem<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayFileSystem")
            .field("memory", &self.memory)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::fs::{DiskBackend, FileKind, StatResult};
    use crate::path::PathResolver;
    use std::fs;
    use tempfile::TempDir;

    /// Backend whose every operation fails with a permission error.
    pub(crate) struct FailingBackend;

    impl PersistentBackend for FailingBackend {
        fn is_file(&self, path: &CanonicalPath) -> StorageResult<bool> {
            Err(StorageError::PermissionDenied(path.clone()))
        }
        fn is_directory(&self, path: &CanonicalPath) -> StorageResult<bool> {
            Err(StorageError::PermissionDenied(path.clone()))
        }
        fn read(&self, path: &CanonicalPath) -> StorageResult<Vec<u8>> {
            Err(StorageError::PermissionDenied(path.clone()))
        }
        fn list(&self, path: &CanonicalPath) -> StorageResult<Vec<String>> {
            Err(StorageError::PermissionDenied(path.clone()))
        }
        fn stat(&self, path: &CanonicalPath) -> StorageResult<StatResult> {
            Err(StorageError::PermissionDenied(path.clone()))
        }
    }

    fn disk_overlay() -> (TempDir, PathResolver, OverlayFileSystem<DiskBackend>) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.ts"), "disk").unwrap();
        fs::create_dir_all(dir.path().join("src/lib")).unwrap();
        let resolver = PathResolver::from_path(dir.path());
        let overlay = OverlayFileSystem::new(DiskBackend::new(), DeviceId::new(7));
        (dir, resolver, overlay)
    }

    #[test]
    fn test_memory_shadows_persistent() {
        let (_dir, r, mut fs) = disk_overlay();
        let path = r.resolve("a.ts");

        assert_eq!(fs.read(&path).unwrap(), b"disk");
        fs.write(&path, b"memory".to_vec(), None);
        assert_eq!(fs.read(&path).unwrap(), b"memory");
        assert!(fs.file_exists(&path, true));
        assert!(fs.file_exists(&path, false));
    }

    #[test]
    fn test_write_read_binary() {
        let (_dir, r, mut fs) = disk_overlay();
        for content in [Vec::new(), vec![0u8, 1, 0, 255], b"text\0with nul".to_vec()] {
            let path = r.resolve("bin.out");
            fs.write(&path, content.clone(), None);
            assert_eq!(fs.read(&path).unwrap(), content);
        }
    }

    #[test]
    fn test_delete_reveals_persistent() {
        let (_dir, r, mut fs) = disk_overlay();
        let shadowed = r.resolve("a.ts");
        let virtual_only = r.resolve("gen.js");

        fs.write(&shadowed, b"memory".to_vec(), None);
        fs.write(&virtual_only, b"x".to_vec(), None);
        fs.delete(&shadowed);
        fs.delete(&virtual_only);

        assert!(fs.file_exists(&shadowed, true));
        assert_eq!(fs.read(&shadowed).unwrap(), b"disk");
        assert!(!fs.file_exists(&virtual_only, true));
    }

    #[test]
    fn test_file_exists_without_delegation() {
        let (_dir, r, fs) = disk_overlay();
        assert!(fs.file_exists(&r.resolve("a.ts"), true));
        assert!(!fs.file_exists(&r.resolve("a.ts"), false));
    }

    #[test]
    fn test_read_directory_is_absent() {
        let (_dir, r, mut fs) = disk_overlay();
        assert!(fs.read(&r.resolve("src")).is_none());
        fs.write(&r.resolve("gen/x.js"), Vec::new(), None);
        assert!(fs.read(&r.resolve("gen")).is_none());
    }

    #[test]
    fn test_write_failure_reports() {
        let (_dir, r, mut fs) = disk_overlay();
        fs.write(&r.resolve("gen/x.js"), Vec::new(), None);

        let mut messages = Vec::new();
        let mut on_error = |msg: &str| messages.push(msg.to_string());
        fs.write(&r.resolve("gen"), b"x".to_vec(), Some(&mut on_error));

        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("is a directory"));
        // Without a callback the failure is silently dropped.
        fs.write(&r.resolve("gen"), b"x".to_vec(), None);
    }

    #[test]
    fn test_directories_union() {
        let (_dir, r, mut fs) = disk_overlay();
        fs.write(&r.resolve("gen/x.js"), Vec::new(), None);
        fs.write(&r.resolve("src/virtual/y.js"), Vec::new(), None);
        fs.write(&r.resolve("src/lib/z.js"), Vec::new(), None);

        let mut root = fs.list_directories(r.base());
        root.sort();
        assert_eq!(root, vec!["gen", "src"]);

        let mut src = fs.list_directories(&r.resolve("src"));
        src.sort();
        assert_eq!(src, vec!["lib", "virtual"]);

        assert!(fs.directory_exists(&r.resolve("gen")));
        assert!(fs.directory_exists(&r.resolve("src/lib")));
        assert!(!fs.directory_exists(&r.resolve("a.ts")));
        assert!(fs.list_directories(&r.resolve("nowhere")).is_empty());
    }

    #[test]
    fn test_stat_precedence_and_synthesis() {
        let (_dir, r, mut fs) = disk_overlay();
        let path = r.resolve("big.js");
        fs.write(&path, vec![b'a'; 1000], None);

        let first = fs.stat(&path).unwrap();
        let second = fs.stat(&path).unwrap();
        assert_eq!(first.blocks, 2);
        assert_eq!(first.size, 1000);
        assert_eq!(first.dev, 7);
        assert_eq!(first.dev, second.dev);

        let disk = fs.stat(&r.resolve("a.ts")).unwrap();
        assert_eq!(disk.kind, FileKind::File);
        assert_eq!(disk.size, 4);
        assert!(fs.stat(&r.resolve("missing")).is_none());
    }

    #[test]
    fn test_failing_backend_degrades() {
        let r = PathResolver::new("/app");
        let mut fs = OverlayFileSystem::new(FailingBackend, DeviceId::new(1));
        let path = r.resolve("a.ts");

        assert!(!fs.file_exists(&path, true));
        assert!(fs.read(&path).is_none());
        assert!(fs.try_read(&path).is_err());
        assert!(!fs.directory_exists(&path));
        assert!(fs.list_directories(&path).is_empty());
        assert!(fs.stat(&path).is_none());

        fs.write(&path, b"ok".to_vec(), None);
        assert_eq!(fs.read(&path).unwrap(), b"ok");
        assert!(fs.try_read(&path).unwrap().is_some());
    }
}
