//! Parsed source representations and their cache.

mod cache;
mod parser;

pub use cache::SourceCache;
pub use parser::{decode_utf8, SourceParser, TextParser, TextSource, DEFAULT_LIB_FILE_NAME};
