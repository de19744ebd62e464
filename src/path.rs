//! Path normalization into a single canonical coordinate space.
//!
//! Every path handled by the overlay is first turned into a [`CanonicalPath`]:
//! forward slashes, rooted at `/`, with `.` / `..` / empty segments collapsed.
//! Windows drive paths map into the same space (`C:\src\a.ts` → `/C/src/a.ts`)
//! and are mapped back by [`PathResolver::denormalize`] for collaborators that
//! expect native paths.
//!
//! All of this is pure string algebra: no I/O, no failure. Malformed input is
//! normalized best-effort.

use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

// =============================================================================
// CanonicalPath
// =============================================================================

/// An absolute, normalized path. The unique key for every stored entry.
///
/// Only [`PathResolver`] and [`CanonicalPath::join`] construct these, so the
/// inner string is always rooted and free of `.`/`..`/duplicate separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Get the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the root path.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Join a relative path onto this one and normalize the result.
    pub fn join(&self, rel: &str) -> Self {
        Self(normalize(&format!("{}/{}", self.0, rel)))
    }

    /// The parent directory, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Whether the path ends with the given suffix.
    #[inline]
    pub fn ends_with(&self, suffix: &str) -> bool {
        self.0.ends_with(suffix)
    }

    /// Replace a trailing `from` suffix with `to`.
    ///
    /// Returns `None` if the path does not end with `from`, or if stripping it
    /// would leave nothing but a directory.
    pub fn replace_suffix(&self, from: &str, to: &str) -> Option<Self> {
        let stem = self.0.strip_suffix(from)?;
        if stem.is_empty() || stem.ends_with('/') {
            return None;
        }
        Some(Self(format!("{stem}{to}")))
    }

    /// The remainder of `self` below `dir`, if `self` is strictly inside it.
    ///
    /// `/a/b/c` relative to `/a` is `b/c`; `/a` relative to `/a` is `None`.
    pub fn strip_dir(&self, dir: &CanonicalPath) -> Option<&str> {
        let rest = if dir.is_root() {
            self.0.strip_prefix('/')?
        } else {
            self.0.strip_prefix(dir.as_str())?.strip_prefix('/')?
        };
        (!rest.is_empty()).then_some(rest)
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CanonicalPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// PathStyle
// =============================================================================

/// Native path convention used when handing paths to external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    /// `/`-separated, used as-is.
    Posix,
    /// Drive-letter paths with `\` separators.
    Windows,
}

impl PathStyle {
    /// The convention of the platform this crate was built for.
    pub const fn native() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }
}

// =============================================================================
// PathResolver
// =============================================================================

/// Anchors arbitrary path strings to a fixed base directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: CanonicalPath,
    style: PathStyle,
}

impl PathResolver {
    /// Create a resolver anchored at `base`, using the native path style.
    ///
    /// A relative base is anchored at the root.
    pub fn new(base: impl AsRef<str>) -> Self {
        Self::with_style(base, PathStyle::native())
    }

    /// Create a resolver with an explicit native path style.
    pub fn with_style(base: impl AsRef<str>, style: PathStyle) -> Self {
        Self {
            base: CanonicalPath::root().join(&normalize(base.as_ref())),
            style,
        }
    }

    /// Create a resolver from a filesystem path.
    pub fn from_path(base: &Path) -> Self {
        Self::new(base.to_string_lossy())
    }

    /// The base directory relative paths are joined to.
    #[inline]
    pub fn base(&self) -> &CanonicalPath {
        &self.base
    }

    /// The native path style used by [`denormalize`](Self::denormalize).
    #[inline]
    pub fn style(&self) -> PathStyle {
        self.style
    }

    /// Normalize `path`, joining it to the base directory if it is relative.
    ///
    /// Idempotent: `resolve(resolve(p)) == resolve(p)`.
    pub fn resolve(&self, path: impl AsRef<str>) -> CanonicalPath {
        let normalized = normalize(path.as_ref());
        if normalized.starts_with('/') {
            CanonicalPath(normalized)
        } else {
            self.base.join(&normalized)
        }
    }

    /// Produce the native string form of a path.
    pub fn denormalize(&self, path: impl AsRef<str>) -> String {
        let path = self.resolve(path);
        match self.style {
            PathStyle::Posix => path.0,
            PathStyle::Windows => to_windows(&path),
        }
    }

    /// Native form with `/` separators, the shape compiler front ends record
    /// as a source file's name.
    pub fn compiler_file_name(&self, path: impl AsRef<str>) -> String {
        self.denormalize(path).replace('\\', "/")
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Normalize a raw path string.
///
/// Absolute input yields a `/`-rooted string; relative input stays relative
/// (leading `..` segments are kept, an empty result stays empty).
fn normalize(raw: &str) -> String {
    let mut path = raw.replace('\\', "/");

    // `C:` or `C:/...` → `/C/...`
    let bytes = path.as_bytes();
    if bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/')
    {
        path = format!("/{}{}", &path[..1], &path[2..]);
    }

    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute { format!("/{joined}") } else { joined }
}

/// `/C/src/a.ts` → `C:\src\a.ts`; paths without a drive segment only swap separators.
fn to_windows(path: &CanonicalPath) -> String {
    let s = path.as_str();
    let mut segments = s[1..].splitn(2, '/');
    let first = segments.next().unwrap_or_default();
    if first.len() == 1 && first.as_bytes()[0].is_ascii_alphabetic() {
        let rest = segments.next().unwrap_or_default();
        format!("{first}:\\{}", rest.replace('/', "\\"))
    } else {
        s.replace('/', "\\")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_joins_base() {
        let resolver = PathResolver::new("/app");
        assert_eq!(resolver.resolve("src/a.ts").as_str(), "/app/src/a.ts");
        assert_eq!(resolver.resolve("./src/../b.ts").as_str(), "/app/b.ts");
        assert_eq!(resolver.resolve("../x").as_str(), "/x");
        assert_eq!(resolver.resolve("").as_str(), "/app");
    }

    #[test]
    fn test_resolve_absolute_normalizes() {
        let resolver = PathResolver::new("/app");
        assert_eq!(resolver.resolve("/a//b/./c/").as_str(), "/a/b/c");
        assert_eq!(resolver.resolve("/../..").as_str(), "/");
        assert_eq!(resolver.resolve("C:\\src\\a.ts").as_str(), "/C/src/a.ts");
    }

    #[test]
    fn test_resolve_idempotent() {
        let resolver = PathResolver::new("/base/dir");
        for input in [
            "a", "./a/b", "../../up", "/abs/../x", "C:\\w\\x", "a\\b\\..\\c", "", ".", "//",
            "x/./y//z/",
        ] {
            let once = resolver.resolve(input);
            assert_eq!(resolver.resolve(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_relative_base_is_anchored() {
        let resolver = PathResolver::new("proj");
        assert_eq!(resolver.base().as_str(), "/proj");
    }

    #[test]
    fn test_denormalize_windows() {
        let resolver = PathResolver::with_style("/", PathStyle::Windows);
        assert_eq!(resolver.denormalize("/C/src/a.ts"), "C:\\src\\a.ts");
        assert_eq!(resolver.denormalize("/src/a.ts"), "\\src\\a.ts");
        assert_eq!(resolver.compiler_file_name("/C/src/a.ts"), "C:/src/a.ts");
    }

    #[test]
    fn test_denormalize_posix() {
        let resolver = PathResolver::with_style("/app", PathStyle::Posix);
        assert_eq!(resolver.denormalize("x/y.html"), "/app/x/y.html");
    }

    #[test]
    fn test_parent() {
        let resolver = PathResolver::new("/");
        let path = resolver.resolve("/a/b.ts");
        assert_eq!(path.parent().unwrap().as_str(), "/a");
        assert_eq!(path.parent().unwrap().parent().unwrap(), CanonicalPath::root());
        assert!(CanonicalPath::root().parent().is_none());
    }

    #[test]
    fn test_replace_suffix() {
        let path = PathResolver::new("/").resolve("/app/a.ts");
        assert_eq!(
            path.replace_suffix(".ts", ".ngfactory.js").unwrap().as_str(),
            "/app/a.ngfactory.js"
        );
        assert!(path.replace_suffix(".js", ".map").is_none());

        let bare = PathResolver::new("/").resolve("/app/.ts");
        assert!(bare.replace_suffix(".ts", ".js").is_none());
    }

    #[test]
    fn test_strip_dir() {
        let resolver = PathResolver::new("/");
        let file = resolver.resolve("/a/b/c.ts");
        assert_eq!(file.strip_dir(&resolver.resolve("/a")), Some("b/c.ts"));
        assert_eq!(file.strip_dir(&CanonicalPath::root()), Some("a/b/c.ts"));
        assert_eq!(file.strip_dir(&resolver.resolve("/a/b/c.ts")), None);
        assert_eq!(file.strip_dir(&resolver.resolve("/a/b/c")), None);
        assert_eq!(resolver.resolve("/ab/c").strip_dir(&resolver.resolve("/a")), None);
    }
}
