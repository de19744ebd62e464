//! `OverlayHost`: the compiler-facing façade over the overlay.
//!
//! # Usage
//!
//! ```
//! use overlay_host::{Config, DiskBackend, OverlayHost, TextParser};
//! use overlay_host::host::CompilerHost;
//!
//! let config = Config { base_dir: "/app".into(), ..Config::default() };
//! let host = OverlayHost::builder(config, DiskBackend::new(), TextParser).build();
//!
//! // Build pipeline: inject generated output.
//! host.write("main.ngfactory.js", "export {}", None);
//! assert!(host.file_exists("/app/main.ngfactory.js"));
//!
//! // Source removed from disk: generated output goes with it.
//! host.invalidate("main.ts");
//! assert!(!host.file_exists("/app/main.ngfactory.js"));
//! ```

use std::cell::RefCell;
use std::sync::Arc;

use super::builder::HostBuilder;
use super::resource::{is_direct_resource, ResourceLoader};
use super::trace::TraceSink;
use crate::config::Config;
use crate::fs::{report, Metadata, OnError, OverlayFileSystem, PersistentBackend};
use crate::invalidate::{Invalidation, InvalidationTracker};
use crate::path::{CanonicalPath, PathResolver};
use crate::source::{decode_utf8, SourceCache, SourceParser};

/// Line terminator reported to the compiler.
pub const NEW_LINE: &str = "\n";

// =============================================================================
// CompilerHost
// =============================================================================

/// Host capabilities a compiler front end is built against.
///
/// Existence and read probes have no failure channel: storage errors show up
/// as `false` / `None`. Write and parse failures go to `on_error`.
pub trait CompilerHost {
    /// Parsed representation returned by [`get_source_file`](Self::get_source_file).
    type Source;

    /// Language level passed through to the parser.
    type Version: Copy;

    /// Whether a file exists.
    fn file_exists(&self, file_name: &str) -> bool;

    /// File content as UTF-8 text (BOM stripped, invalid bytes replaced).
    fn read_file(&self, file_name: &str) -> Option<String>;

    /// File content as raw bytes.
    fn read_file_buffer(&self, file_name: &str) -> Option<Vec<u8>>;

    /// Whether a directory exists.
    fn directory_exists(&self, directory_name: &str) -> bool;

    /// Names of the child directories of `path`.
    fn get_directories(&self, path: &str) -> Vec<String>;

    /// Metadata for a path.
    fn stat(&self, path: &str) -> Option<Metadata>;

    /// Parsed source for a file, cached when enabled.
    fn get_source_file(
        &self,
        file_name: &str,
        version: Self::Version,
        on_error: OnError<'_>,
    ) -> Option<Arc<Self::Source>>;

    /// Default library file name of the front end.
    fn get_default_lib_file_name(&self) -> String;

    /// Store emitted output.
    fn write_file(&self, file_name: &str, data: &str, on_error: OnError<'_>);

    /// Directory relative names are resolved against.
    fn get_current_directory(&self) -> String;

    /// Key the compiler uses to compare file names.
    fn get_canonical_file_name(&self, file_name: &str) -> String;

    /// Whether file names are compared case-sensitively.
    fn use_case_sensitive_file_names(&self) -> bool;

    /// Line terminator for emitted text.
    fn get_new_line(&self) -> &str;

    /// Record a diagnostic trace line.
    fn trace(&self, message: &str);
}

// =============================================================================
// OverlayHost
// =============================================================================

/// Compiler host over a persistent backend with an in-memory overlay,
/// derived-artifact tracking and a parsed source cache.
///
/// One instance serves one compilation session. Methods take `&self` so the
/// host can be handed to a front end while the build pipeline keeps
/// invalidating; state lives in `RefCell`s and the host is not `Sync`.
pub struct OverlayHost<B, P: SourceParser> {
    config: Config,
    resolver: PathResolver,
    fs: RefCell<OverlayFileSystem<B>>,
    cache: RefCell<SourceCache<P::Output>>,
    tracker: RefCell<InvalidationTracker>,
    parser: P,
    resources: Option<Box<dyn ResourceLoader>>,
    trace: Box<dyn TraceSink>,
}

impl<B: PersistentBackend, P: SourceParser> OverlayHost<B, P> {
    /// Create a builder for explicit configuration.
    pub fn builder(config: Config, backend: B, parser: P) -> HostBuilder<B, P> {
        HostBuilder::new(config, backend, parser)
    }

    // =========================================================================
    // Internal Constructor
    // =========================================================================

    pub(crate) fn new(
        config: Config,
        resolver: PathResolver,
        fs: OverlayFileSystem<B>,
        tracker: InvalidationTracker,
        parser: P,
        resources: Option<Box<dyn ResourceLoader>>,
        trace: Box<dyn TraceSink>,
    ) -> Self {
        let cache = SourceCache::new(config.cache_source_files);
        Self {
            config,
            resolver,
            fs: RefCell::new(fs),
            cache: RefCell::new(cache),
            tracker: RefCell::new(tracker),
            parser,
            resources,
            trace,
        }
    }

    // =========================================================================
    // Paths
    // =========================================================================

    /// The active configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The path resolver anchored at the base directory.
    #[inline]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Resolve a raw path against the base directory.
    pub fn resolve(&self, path: &str) -> CanonicalPath {
        self.resolver.resolve(path)
    }

    /// Native form of a path, for collaborators outside the overlay.
    pub fn denormalize_path(&self, path: &str) -> String {
        self.resolver.denormalize(path)
    }

    // =========================================================================
    // Build Pipeline Surface
    // =========================================================================

    /// Whether a file exists, optionally ignoring persistent storage.
    pub fn file_exists_with(&self, file_name: &str, delegate: bool) -> bool {
        self.fs.borrow().file_exists(&self.resolve(file_name), delegate)
    }

    /// Store content in the memory layer.
    pub fn write(&self, file_name: &str, content: impl Into<Vec<u8>>, on_error: OnError<'_>) {
        let path = self.resolve(file_name);
        let result = self.fs.borrow_mut().try_write(&path, content.into());
        if let Err(e) = result {
            report(on_error, &e.to_string());
        }
    }

    /// Remove a memory-layer entry. Storage is never touched.
    pub fn delete(&self, file_name: &str) -> bool {
        self.fs.borrow_mut().delete(&self.resolve(file_name))
    }

    /// React to a file having changed or disappeared.
    pub fn invalidate(&self, file_name: &str) -> Invalidation {
        let path = self.resolve(file_name);
        self.tracker.borrow_mut().invalidate(
            &path,
            &mut *self.fs.borrow_mut(),
            &mut *self.cache.borrow_mut(),
        )
    }

    /// Start a new change-tracking checkpoint.
    pub fn reset_changed_file_tracker(&self) {
        self.tracker.borrow_mut().reset_changed_set();
    }

    /// Files invalidated while still present in storage since the last reset.
    pub fn changed_file_paths(&self) -> Vec<CanonicalPath> {
        self.tracker.borrow().changed_paths()
    }

    /// Generated outputs in the memory layer, in native path form.
    pub fn list_generated_output_paths(&self) -> Vec<String> {
        let tracker = self.tracker.borrow();
        let fs = self.fs.borrow();
        fs.memory()
            .paths()
            .filter(|path| tracker.rules().is_listed_output(path))
            .map(|path| self.resolver.denormalize(path))
            .collect()
    }

    /// Every file path in the memory layer.
    pub fn virtual_files(&self) -> Vec<CanonicalPath> {
        self.fs.borrow().virtual_files()
    }

    /// The cached parsed source for a file, without parsing.
    pub fn cached_source(&self, file_name: &str) -> Option<Arc<P::Output>> {
        self.cache.borrow().get(&self.resolve(file_name))
    }

    // =========================================================================
    // Resources
    // =========================================================================

    /// Install the resolver used for template and style assets.
    pub fn set_resource_loader(&mut self, loader: impl ResourceLoader + 'static) {
        self.resources = Some(Box::new(loader));
    }

    /// Text of an auxiliary asset.
    ///
    /// With direct template loading on, `.html`/`.svg` assets are read through
    /// the overlay. Otherwise the resource loader is asked with the native path,
    /// falling back to the overlay when no loader is installed.
    pub fn read_resource(&self, file_name: &str) -> Option<String> {
        if self.config.direct_template_loading && is_direct_resource(file_name) {
            return self.read_file(file_name);
        }
        match &self.resources {
            Some(loader) => loader.get(&self.denormalize_path(file_name)),
            None => self.read_file(file_name),
        }
    }
}

impl<B: PersistentBackend, P: SourceParser> CompilerHost for OverlayHost<B, P> {
    type Source = P::Output;
    type Version = P::Version;

    fn file_exists(&self, file_name: &str) -> bool {
        self.file_exists_with(file_name, true)
    }

    fn read_file(&self, file_name: &str) -> Option<String> {
        let path = self.resolve(file_name);
        let content = self.fs.borrow().read(&path)?;
        Some(decode_utf8(&content).into_owned())
    }

    fn read_file_buffer(&self, file_name: &str) -> Option<Vec<u8>> {
        self.fs.borrow().read(&self.resolve(file_name))
    }

    fn directory_exists(&self, directory_name: &str) -> bool {
        self.fs.borrow().directory_exists(&self.resolve(directory_name))
    }

    fn get_directories(&self, path: &str) -> Vec<String> {
        self.fs.borrow().list_directories(&self.resolve(path))
    }

    fn stat(&self, path: &str) -> Option<Metadata> {
        self.fs.borrow().stat(&self.resolve(path))
    }

    fn get_source_file(
        &self,
        file_name: &str,
        version: Self::Version,
        on_error: OnError<'_>,
    ) -> Option<Arc<Self::Source>> {
        let path = self.resolve(file_name);
        let name = self.resolver.compiler_file_name(file_name);

        // Collect the failure first so `on_error` may call back into the host.
        let mut failure = None;
        let source = self.cache.borrow_mut().get_or_parse(
            &path,
            &name,
            &*self.fs.borrow(),
            &self.parser,
            version,
            Some(&mut |message: &str| failure = Some(message.to_owned())),
        );
        if let Some(message) = failure {
            report(on_error, &message);
        }
        source
    }

    fn get_default_lib_file_name(&self) -> String {
        self.parser.default_lib_file_name()
    }

    fn write_file(&self, file_name: &str, data: &str, on_error: OnError<'_>) {
        self.write(file_name, data.as_bytes(), on_error);
    }

    fn get_current_directory(&self) -> String {
        self.resolver.base().to_string()
    }

    fn get_canonical_file_name(&self, file_name: &str) -> String {
        let path = self.resolve(file_name);
        if self.config.case_sensitive {
            path.to_string()
        } else {
            path.as_str().to_lowercase()
        }
    }

    fn use_case_sensitive_file_names(&self) -> bool {
        self.config.case_sensitive
    }

    fn get_new_line(&self) -> &str {
        NEW_LINE
    }

    fn trace(&self, message: &str) {
        self.trace.trace(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::fs::{DeviceId, DiskBackend, FailingBackend};
    use crate::host::{MapResourceLoader, MemoryTrace};
    use crate::path::PathStyle;
    use crate::source::{TextParser, TextSource};
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn host_in(dir: &TempDir, config: Config) -> OverlayHost<DiskBackend, TextParser> {
        let config = Config {
            base_dir: dir.path().to_string_lossy().into_owned(),
            ..config
        };
        OverlayHost::builder(config, DiskBackend::new(), TextParser)
            .device_id(DeviceId::new(3))
            .build()
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.ts"), "X").unwrap();
        fs::write(dir.path().join("view.html"), "<disk/>").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        dir
    }

    #[test]
    fn test_scenario_generated_files_removed_with_source() {
        let dir = project();
        let host = host_in(&dir, Config::default());
        host.write("a.ngfactory.js", "factory", None);
        host.write("a.ngfactory.js.map", "{}", None);

        let outcome = host.invalidate("a.ts");

        assert_eq!(outcome.deleted.len(), 2);
        assert!(!host.file_exists("a.ngfactory.js"));
        assert!(!host.file_exists("a.ngfactory.js.map"));
    }

    #[test]
    fn test_scenario_existing_source_marked_changed() {
        let dir = project();
        let host = host_in(&dir, Config::default());

        let outcome = host.invalidate("b.ts");

        assert!(outcome.changed);
        assert!(outcome.deleted.is_empty());
        assert_eq!(host.changed_file_paths(), vec![host.resolve("b.ts")]);
        host.reset_changed_file_tracker();
        assert!(host.changed_file_paths().is_empty());
    }

    #[test]
    fn test_scenario_stat_memory_entry() {
        let dir = project();
        let host = host_in(&dir, Config::default());
        host.write("big.js", vec![b'x'; 1000], None);

        let first = host.stat("big.js").unwrap();
        let second = host.stat("big.js").unwrap();
        assert_eq!(first.blocks, 2);
        assert_eq!(first.dev, second.dev);
        assert_eq!(first.dev, 3);
    }

    #[test]
    fn test_read_text_and_bytes() {
        let dir = project();
        let host = host_in(&dir, Config::default());

        assert_eq!(host.read_file("b.ts").as_deref(), Some("X"));
        host.write("bom.ts", b"\xef\xbb\xbfhi".to_vec(), None);
        assert_eq!(host.read_file("bom.ts").as_deref(), Some("hi"));
        assert_eq!(host.read_file_buffer("bom.ts").unwrap().len(), 5);
        assert!(host.read_file("missing.ts").is_none());
        assert!(host.read_file("src").is_none());
    }

    #[test]
    fn test_source_file_cache_coherence() {
        let dir = project();
        let host = host_in(&dir, Config::default());

        let first = host.get_source_file("b.ts", (), None).unwrap();
        let second = host.get_source_file("b.ts", (), None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.name().ends_with("/b.ts"));

        fs::write(dir.path().join("b.ts"), "Y").unwrap();
        host.invalidate("b.ts");
        assert!(host.cached_source("b.ts").is_none());
        let third = host.get_source_file("b.ts", (), None).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.text(), "Y");
    }

    #[test]
    fn test_source_file_cache_disabled() {
        let dir = project();
        let config = Config {
            cache_source_files: false,
            ..Config::default()
        };
        let host = host_in(&dir, config);

        let first: Arc<TextSource> = host.get_source_file("b.ts", (), None).unwrap();
        let second = host.get_source_file("b.ts", (), None).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(host.cached_source("b.ts").is_none());
    }

    #[test]
    fn test_non_utf8_file_is_readable() {
        let dir = project();
        let host = host_in(&dir, Config::default());
        host.write("latin1.ts", vec![b'/', b'/', b' ', 0xe9], None);

        let mut seen = Vec::new();
        let mut on_error = |message: &str| seen.push(message.to_owned());
        assert!(host.file_exists("latin1.ts"));
        assert_eq!(host.read_file("latin1.ts").as_deref(), Some("// \u{fffd}"));
        assert_eq!(host.read_file_buffer("latin1.ts").unwrap().len(), 4);
        let source = host.get_source_file("latin1.ts", (), Some(&mut on_error)).unwrap();
        assert_eq!(source.text(), "// \u{fffd}");
        assert!(seen.is_empty());
    }

    #[test]
    fn test_source_file_error_may_reenter_host() {
        let host = OverlayHost::builder(Config::default(), FailingBackend, TextParser)
            .path_style(PathStyle::Posix)
            .build();

        let mut seen = Vec::new();
        let mut on_error = |message: &str| {
            seen.push(message.to_owned());
            host.write("error.log", message, None);
        };
        assert!(host.get_source_file("on-disk.ts", (), Some(&mut on_error)).is_none());
        assert_eq!(seen.len(), 1);
        assert!(host.file_exists("error.log"));
    }

    #[test]
    fn test_write_file_error_callback() {
        let dir = project();
        let host = host_in(&dir, Config::default());
        host.write_file("out/a.js", "a", None);

        let mut seen = Vec::new();
        let mut on_error = |message: &str| seen.push(message.to_owned());
        host.write_file("out", "oops", Some(&mut on_error));
        assert_eq!(seen.len(), 1);
        assert_eq!(host.read_file("out/a.js").as_deref(), Some("a"));
    }

    #[test]
    fn test_directories() {
        let dir = project();
        let host = host_in(&dir, Config::default());
        host.write("gen/a.js", "", None);

        assert!(host.directory_exists("src"));
        assert!(host.directory_exists("gen"));
        let mut dirs = host.get_directories(".");
        dirs.sort();
        assert_eq!(dirs, vec!["gen", "src"]);
    }

    #[test]
    fn test_generated_output_listing() {
        let dir = project();
        let host = host_in(&dir, Config::default());
        host.write("a.ngfactory.js", "", None);
        host.write("a.ngstyle.js", "", None);
        host.write("a.js", "", None);

        let mut listed = host.list_generated_output_paths();
        listed.sort();
        assert_eq!(
            listed,
            vec![
                host.denormalize_path("a.ngfactory.js"),
                host.denormalize_path("a.ngstyle.js"),
            ]
        );
        assert_eq!(host.virtual_files().len(), 3);
    }

    #[test]
    fn test_canonical_file_names() {
        let dir = project();
        let sensitive = host_in(&dir, ConfigBuilder::new().case_sensitive(true).build());
        let insensitive = host_in(&dir, ConfigBuilder::new().case_sensitive(false).build());

        assert_eq!(sensitive.get_canonical_file_name("/App/Main.TS"), "/App/Main.TS");
        assert!(sensitive.use_case_sensitive_file_names());
        assert_eq!(insensitive.get_canonical_file_name("/App/Main.TS"), "/app/main.ts");
        assert!(!insensitive.use_case_sensitive_file_names());
    }

    #[test]
    fn test_host_constants() {
        let dir = project();
        let host = host_in(&dir, Config::default());
        assert_eq!(host.get_new_line(), "\n");
        assert_eq!(host.get_default_lib_file_name(), "lib.d.ts");
        assert_eq!(host.get_current_directory(), host.resolver().base().to_string());
    }

    #[test]
    fn test_read_resource_modes() {
        let dir = project();
        let mut loader = MapResourceLoader::new();
        let mut host = host_in(&dir, Config::default());
        loader.insert(host.denormalize_path("view.html"), "<loader/>");

        // No loader: straight through the overlay.
        assert_eq!(host.read_resource("view.html").as_deref(), Some("<disk/>"));

        host.set_resource_loader(loader.clone());
        assert_eq!(host.read_resource("view.html").as_deref(), Some("<loader/>"));

        let config = Config {
            direct_template_loading: true,
            ..Config::default()
        };
        let mut direct = host_in(&dir, config);
        direct.set_resource_loader(loader);
        assert_eq!(direct.read_resource("view.html").as_deref(), Some("<disk/>"));
    }

    #[test]
    fn test_trace_sink() {
        let dir = project();
        let sink = Rc::new(MemoryTrace::new());
        let config = Config {
            base_dir: dir.path().to_string_lossy().into_owned(),
            ..Config::default()
        };
        let host = OverlayHost::builder(config, DiskBackend::new(), TextParser)
            .trace_sink(Rc::clone(&sink))
            .path_style(PathStyle::native())
            .build();

        host.trace("resolving module");
        assert_eq!(sink.lines(), vec!["resolving module"]);
    }
}
