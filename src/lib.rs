//! # overlay-host
//!
//! A layered, incrementally-invalidated virtual file system for compiler hosts.
//!
//! A compiler front end talks to an [`OverlayHost`] instead of the disk. The
//! host behaves like a plain read-only file system, while the build pipeline
//! injects generated output into an in-memory layer that always shadows
//! storage:
//!
//! - **Overlay**: memory layer first, persistent storage second
//! - **Stat synthesis**: memory entries report self-consistent metadata
//! - **Invalidation**: changed-file tracking, and cleanup of generated output
//!   when its source disappears
//! - **Source cache**: parsed sources memoized until invalidated
//!
//! ## Quick Start
//!
//! ```
//! use overlay_host::prelude::*;
//!
//! let config = ConfigBuilder::new().base_dir("/project").build();
//! let host = OverlayHost::builder(config, DiskBackend::new(), TextParser).build();
//!
//! host.write("src/app.js", "console.log(1)", None);
//! assert_eq!(host.read_file("src/app.js").as_deref(), Some("console.log(1)"));
//!
//! let source = host.get_source_file("src/app.js", (), None).unwrap();
//! assert_eq!(source.line_count(), 1);
//!
//! host.invalidate("src/app.ts");
//! assert!(!host.file_exists("src/app.js"));
//! ```
//!
//! ## Modules
//!
//! - [`path`]: canonical paths and base-directory resolution
//! - [`mod@fs`]: persistent backend, memory layer, overlay, metadata
//! - [`source`]: parser trait and parsed source cache
//! - [`invalidate`]: changed set and derived-artifact rules
//! - [`host`]: the compiler-facing host
//! - [`config`]: host options

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod fs;
pub mod host;
pub mod invalidate;
pub mod path;
pub mod source;

// =============================================================================
// Prelude - import commonly used items with a single `use`
// =============================================================================

/// Prelude module for convenient imports.
///
/// ```
/// use overlay_host::prelude::*;
/// ```
pub mod prelude {
    // Host
    pub use crate::{CompilerHost, HostBuilder, OverlayHost};

    // Configuration
    pub use crate::{Config, ConfigBuilder};

    // File system
    pub use crate::{DiskBackend, Metadata, PersistentBackend};

    // Sources
    pub use crate::{SourceParser, TextParser, TextSource};

    // Paths
    pub use crate::{CanonicalPath, PathResolver};
}

// =============================================================================
// Host
// =============================================================================

pub use host::{
    CompilerHost, HostBuilder, MapResourceLoader, MemoryTrace, OverlayHost, ResourceLoader,
    StderrTrace, TraceSink,
};

// =============================================================================
// Infrastructure
// =============================================================================

pub use config::{Config, ConfigBuilder};
pub use error::{ConfigError, ParseError, StorageError, StorageResult};
pub use fs::{
    DeviceId, DiskBackend, FileKind, MemoryLayer, Metadata, OnError, OverlayFileSystem,
    PartialStats, PersistentBackend, StatResult,
};
pub use invalidate::{ArtifactRules, Invalidation, InvalidationTracker, SourceRule};
pub use path::{CanonicalPath, PathResolver, PathStyle};
pub use source::{SourceCache, SourceParser, TextParser, TextSource};
