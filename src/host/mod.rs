//! Compiler host over the overlay.
//!
//! [`OverlayHost`] ties the pieces together:
//!
//! - **Reads** (`file_exists`, `read_file`, `stat`, ...) resolve the path and go
//!   through the overlay
//! - **`get_source_file`** short-circuits through the source cache
//! - **`write`** targets the memory layer
//! - **`invalidate`** evicts the cache entry, records changes and cascades
//!   deletion of derived artifacts

mod builder;
mod core;
mod resource;
mod trace;

pub use builder::HostBuilder;
pub use core::{CompilerHost, OverlayHost, NEW_LINE};
pub use resource::{is_direct_resource, MapResourceLoader, ResourceLoader, DIRECT_RESOURCE_SUFFIXES};
pub use trace::{MemoryTrace, StderrTrace, TraceSink};
