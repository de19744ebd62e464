//! Parsed source cache.
//!
//! ```text
//! SourceCache
//! └── FxHashMap<CanonicalPath, Arc<Output>>
//!     ├── hit  ─► returned as-is, content is not re-read
//!     └── miss ─► OverlayFileSystem::try_read ─► decode ─► parse ─► store
//! ```
//!
//! Entries are only ever removed by [`SourceCache::evict`]; a cached entry can
//! go stale if content changes without an invalidation.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::parser::{decode_utf8, SourceParser};
use crate::fs::{report, OnError, OverlayFileSystem, PersistentBackend};
use crate::path::CanonicalPath;

/// Memoized parsed sources keyed by canonical path.
#[derive(Debug)]
pub struct SourceCache<S> {
    entries: FxHashMap<CanonicalPath, Arc<S>>,
    enabled: bool,
}

impl<S> SourceCache<S> {
    /// Create a cache. With `enabled` off every lookup re-parses.
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: FxHashMap::default(),
            enabled,
        }
    }

    /// Whether parsed sources are retained.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The cached entry for `path`, if any.
    pub fn get(&self, path: &CanonicalPath) -> Option<Arc<S>> {
        self.entries.get(path).cloned()
    }

    /// Drop the entry for `path`. Returns `true` if one was cached.
    pub fn evict(&mut self, path: &CanonicalPath) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached entry for `path` or parse it from the overlay.
    ///
    /// Missing content yields `None` without caching. Read and parse failures
    /// are reported to `on_error` and also yield `None`.
    pub fn get_or_parse<B, P>(
        &mut self,
        path: &CanonicalPath,
        file_name: &str,
        fs: &OverlayFileSystem<B>,
        parser: &P,
        version: P::Version,
        on_error: OnError<'_>,
    ) -> Option<Arc<S>>
    where
        B: PersistentBackend,
        P: SourceParser<Output = S>,
    {
        if self.enabled
            && let Some(cached) = self.entries.get(path)
        {
            return Some(Arc::clone(cached));
        }

        let content = match fs.try_read(path) {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(e) => {
                report(on_error, &e.to_string());
                return None;
            }
        };

        match parser.parse(file_name, &decode_utf8(&content), version) {
            Ok(source) => {
                let source = Arc::new(source);
                if self.enabled {
                    self.entries.insert(path.clone(), Arc::clone(&source));
                }
                Some(source)
            }
            Err(e) => {
                report(on_error, &e.to_string());
                None
            }
        }
    }
}

impl<S> Default for SourceCache<S> {
    fn default() -> Self {
        Self::new(true)
    }
}
