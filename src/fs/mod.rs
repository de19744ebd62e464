//! Layered file system: persistent storage overlaid with generated content.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    File Access Flow                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  CanonicalPath ──► OverlayFileSystem                        │
//! │                    │                                        │
//! │                    ├─► MemoryLayer has an opinion?          │
//! │                    │   └─► answer from memory, stop         │
//! │                    │                                        │
//! │                    └─► PersistentBackend                    │
//! │                        └─► any failure ⇒ false / None       │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Metadata
//!
//! Stats are returned as [`StatResult::Native`] or [`StatResult::Synthesized`];
//! the latter are completed by [`synthesize`] so every caller sees a
//! self-consistent [`Metadata`].

mod backend;
mod memory;
mod overlay;
mod stat;

pub use backend::{DiskBackend, PersistentBackend};
pub use memory::MemoryLayer;
pub use overlay::{OnError, OverlayFileSystem};
pub(crate) use overlay::report;
pub use stat::{
    synthesize, DeviceId, FileKind, Metadata, PartialStats, StatResult, Timestamp,
    DEFAULT_BLOCK_SIZE, DEFAULT_MODE,
};

#[cfg(test)]
pub(crate) use overlay::tests::FailingBackend;
