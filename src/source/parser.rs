//! Parsing file text into a cached representation.

use std::borrow::Cow;

use crate::error::ParseError;

/// Default library file name reported by [`TextParser`].
pub const DEFAULT_LIB_FILE_NAME: &str = "lib.d.ts";

/// The compiler front end's parser, as seen by the source cache.
pub trait SourceParser {
    /// Parsed representation of one file.
    type Output;

    /// Language level selector passed through from the compiler.
    type Version: Copy;

    /// Parse `text`. `file_name` is the name the front end records for the file.
    fn parse(
        &self,
        file_name: &str,
        text: &str,
        version: Self::Version,
    ) -> Result<Self::Output, ParseError>;

    /// File name of the front end's default library.
    fn default_lib_file_name(&self) -> String;
}

/// Decode bytes as UTF-8, stripping BOM if present.
///
/// Never fails: invalid sequences become U+FFFD.
pub fn decode_utf8(buf: &[u8]) -> Cow<'_, str> {
    let buf = buf.strip_prefix(b"\xef\xbb\xbf").unwrap_or(buf);
    String::from_utf8_lossy(buf)
}

// =============================================================================
// TextParser
// =============================================================================

/// Plain text split into lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSource {
    name: String,
    text: String,
    line_starts: Vec<usize>,
}

impl TextSource {
    /// Index `text` under `name`.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self {
            name: name.into(),
            text,
            line_starts,
        }
    }

    /// File name as recorded by the front end.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines (a trailing newline starts an empty last line).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of a zero-based line, without its line terminator.
    pub fn line(&self, index: usize) -> Option<&str> {
        let start = *self.line_starts.get(index)?;
        let end = self
            .line_starts
            .get(index + 1)
            .map_or(self.text.len(), |next| next - 1);
        let line = &self.text[start..end];
        Some(line.strip_suffix('\r').unwrap_or(line))
    }

    /// Zero-based line containing a byte offset.
    pub fn byte_to_line(&self, offset: usize) -> Option<usize> {
        (offset <= self.text.len())
            .then(|| self.line_starts.partition_point(|&start| start <= offset) - 1)
    }
}

/// Front end that only line-indexes text; useful for tooling that needs the
/// cache and overlay without a language parser.
#[derive(Debug, Clone, Default)]
pub struct TextParser;

impl SourceParser for TextParser {
    type Output = TextSource;
    type Version = ();

    fn parse(&self, file_name: &str, text: &str, _version: ()) -> Result<TextSource, ParseError> {
        Ok(TextSource::new(file_name, text))
    }

    fn default_lib_file_name(&self) -> String {
        DEFAULT_LIB_FILE_NAME.to_string()
    }
}
