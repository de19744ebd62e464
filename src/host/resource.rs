//! External resolver for auxiliary assets (templates, stylesheets).

use rustc_hash::FxHashMap;

/// Fetches asset text by native path.
///
/// Returning `None` means the resolver has no content for the path.
pub trait ResourceLoader {
    /// Text of the asset at `native_path`.
    fn get(&self, native_path: &str) -> Option<String>;
}

/// Asset suffixes read straight through the overlay when direct template
/// loading is enabled.
pub const DIRECT_RESOURCE_SUFFIXES: &[&str] = &[".html", ".svg"];

/// Whether `file_name` is an asset eligible for direct loading.
pub fn is_direct_resource(file_name: &str) -> bool {
    DIRECT_RESOURCE_SUFFIXES
        .iter()
        .any(|suffix| file_name.ends_with(suffix))
}

/// A simple map-based resource loader.
///
/// Keys are native paths, exactly as the host passes them.
#[derive(Debug, Default, Clone)]
pub struct MapResourceLoader {
    resources: FxHashMap<String, String>,
}

impl MapResourceLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register asset text for a native path.
    pub fn insert(&mut self, native_path: impl Into<String>, content: impl Into<String>) {
        self.resources.insert(native_path.into(), content.into());
    }

    /// Number of registered assets.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether no assets are registered.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceLoader for MapResourceLoader {
    fn get(&self, native_path: &str) -> Option<String> {
        self.resources.get(native_path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_resource_suffixes() {
        assert!(is_direct_resource("/app/a.component.html"));
        assert!(is_direct_resource("/app/icon.svg"));
        assert!(!is_direct_resource("/app/a.component.css"));
    }

    #[test]
    fn test_map_loader() {
        let mut loader = MapResourceLoader::new();
        loader.insert("/app/a.html", "<p></p>");
        assert_eq!(loader.get("/app/a.html").as_deref(), Some("<p></p>"));
        assert!(loader.get("/app/b.html").is_none());
        assert_eq!(loader.len(), 1);
    }
}
