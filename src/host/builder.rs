//! Builder pattern for `OverlayHost`.

use super::core::OverlayHost;
use super::resource::ResourceLoader;
use super::trace::{StderrTrace, TraceSink};
use crate::config::Config;
use crate::fs::{DeviceId, OverlayFileSystem, PersistentBackend};
use crate::invalidate::{ArtifactRules, InvalidationTracker};
use crate::path::{PathResolver, PathStyle};
use crate::source::SourceParser;

/// Builder for configuring `OverlayHost`.
///
/// Use `OverlayHost::builder()` to create a builder.
pub struct HostBuilder<B, P> {
    config: Config,
    backend: B,
    parser: P,
    device: Option<DeviceId>,
    rules: Option<ArtifactRules>,
    style: Option<PathStyle>,
    resources: Option<Box<dyn ResourceLoader>>,
    trace: Option<Box<dyn TraceSink>>,
}

impl<B: PersistentBackend, P: SourceParser> HostBuilder<B, P> {
    /// Create a new builder.
    pub(crate) fn new(config: Config, backend: B, parser: P) -> Self {
        Self {
            config,
            backend,
            parser,
            device: None,
            rules: None,
            style: None,
            resources: None,
            trace: None,
        }
    }

    /// Use a fixed device id for synthesized metadata.
    ///
    /// Default: random, chosen once when the host is built.
    pub fn device_id(mut self, device: DeviceId) -> Self {
        self.device = Some(device);
        self
    }

    /// Replace the derived-artifact naming rules.
    ///
    /// Default: [`ArtifactRules::default`].
    pub fn artifact_rules(mut self, rules: ArtifactRules) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Set the native path convention used when handing paths out.
    ///
    /// Default: the platform's.
    pub fn path_style(mut self, style: PathStyle) -> Self {
        self.style = Some(style);
        self
    }

    /// Install a resolver for template and style assets.
    pub fn resource_loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.resources = Some(Box::new(loader));
        self
    }

    /// Send trace lines to `sink`.
    ///
    /// Default: [`StderrTrace`], coloured when the `colored-trace` feature is on.
    pub fn trace_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.trace = Some(Box::new(sink));
        self
    }

    /// Build the `OverlayHost`.
    pub fn build(self) -> OverlayHost<B, P> {
        let style = self.style.unwrap_or(PathStyle::native());
        let resolver = PathResolver::with_style(&self.config.base_dir, style);
        let fs = OverlayFileSystem::new(self.backend, self.device.unwrap_or_else(DeviceId::random));
        let tracker = InvalidationTracker::new(self.rules.unwrap_or_default());
        let trace = self
            .trace
            .unwrap_or_else(|| Box::new(StderrTrace::new().colored(cfg!(feature = "colored-trace"))));

        OverlayHost::new(
            self.config,
            resolver,
            fs,
            tracker,
            self.parser,
            self.resources,
            trace,
        )
    }
}
