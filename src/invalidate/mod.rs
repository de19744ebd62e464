//! Change tracking and cascading cleanup of derived artifacts.
//!
//! `invalidate(path)`:
//!
//! 1. evict `path` from the source cache
//! 2. probe persistent storage; if the file is there, record it as changed
//! 3. if it is gone and has a source suffix, delete its derived artifacts
//!    from the memory layer
//! 4. if `path` is itself a plain emitted output, delete it from memory
//!
//! A failed probe counts as "gone", so ambiguous failures favor cleanup.

mod rules;

pub use rules::{ArtifactRules, SourceRule};

use rustc_hash::FxHashSet;

use crate::fs::{OverlayFileSystem, PersistentBackend};
use crate::path::CanonicalPath;
use crate::source::SourceCache;

/// What a single invalidation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invalidation {
    /// A cached parsed source was dropped.
    pub evicted: bool,
    /// The path still exists in storage and was recorded as changed.
    pub changed: bool,
    /// Memory-layer files removed.
    pub deleted: Vec<CanonicalPath>,
}

/// Owns the changed set between checkpoints.
#[derive(Debug, Default)]
pub struct InvalidationTracker {
    changed: FxHashSet<CanonicalPath>,
    rules: ArtifactRules,
}

impl InvalidationTracker {
    /// Create a tracker with the given naming rules.
    pub fn new(rules: ArtifactRules) -> Self {
        Self {
            changed: FxHashSet::default(),
            rules,
        }
    }

    /// The naming rules in use.
    #[inline]
    pub fn rules(&self) -> &ArtifactRules {
        &self.rules
    }

    /// React to `path` having changed or disappeared.
    pub fn invalidate<B, S>(
        &mut self,
        path: &CanonicalPath,
        fs: &mut OverlayFileSystem<B>,
        cache: &mut SourceCache<S>,
    ) -> Invalidation
    where
        B: PersistentBackend,
    {
        let mut outcome = Invalidation {
            evicted: cache.evict(path),
            ..Invalidation::default()
        };

        let exists = fs.persistent_file_exists(path);
        if exists {
            self.changed.insert(path.clone());
            outcome.changed = true;
        } else {
            for derived in self.rules.derived_paths(path) {
                if fs.delete_virtual_file(&derived) {
                    outcome.deleted.push(derived);
                }
            }
        }

        if self.rules.is_reemitted(path) && fs.delete_virtual_file(path) {
            outcome.deleted.push(path.clone());
        }

        outcome
    }

    /// Paths recorded since the last reset.
    #[inline]
    pub fn changed_set(&self) -> &FxHashSet<CanonicalPath> {
        &self.changed
    }

    /// Paths recorded since the last reset, as a list.
    pub fn changed_paths(&self) -> Vec<CanonicalPath> {
        self.changed.iter().cloned().collect()
    }

    /// Start a new checkpoint.
    pub fn reset_changed_set(&mut self) {
        self.changed.clear();
    }
}
