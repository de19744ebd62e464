//! Configuration for an overlay host.
//!
//! Use [`ConfigBuilder`] to set options in code, or [`Config::from_json`] to
//! read them from a build configuration file.

use serde_json::Value as JsonValue;

use crate::error::ConfigError;

/// Options recognized by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory relative paths are resolved against.
    pub base_dir: String,
    /// Keep parsed sources between lookups.
    pub cache_source_files: bool,
    /// Read `.html`/`.svg` assets through the overlay instead of the resource loader.
    pub direct_template_loading: bool,
    /// Whether canonical file names preserve case.
    pub case_sensitive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: "/".to_string(),
            cache_source_files: true,
            direct_template_loading: false,
            case_sensitive: platform_case_sensitive(),
        }
    }
}

/// Case sensitivity of the platform this crate was built for.
pub const fn platform_case_sensitive() -> bool {
    !cfg!(windows)
}

impl Config {
    /// Read options from a JSON object.
    ///
    /// Recognized keys: `basePath`, `cacheSourceFiles`, `directTemplateLoading`,
    /// `caseSensitive`. Missing keys keep their defaults; unknown keys are ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use overlay_host::config::Config;
    ///
    /// let config = Config::from_json(r#"{ "basePath": "/app", "cacheSourceFiles": false }"#)?;
    /// assert_eq!(config.base_dir, "/app");
    /// assert!(!config.cache_source_files);
    /// # Ok::<(), overlay_host::ConfigError>(())
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: JsonValue = serde_json::from_str(json)?;
        let object = value.as_object().ok_or(ConfigError::NotAnObject)?;
        let mut builder = ConfigBuilder::new();

        if let Some(v) = object.get("basePath") {
            builder = builder.base_dir(v.as_str().ok_or(ConfigError::InvalidField {
                field: "basePath",
                expected: "string",
            })?);
        }
        if let Some(v) = object.get("cacheSourceFiles") {
            builder = builder.cache_source_files(bool_field(v, "cacheSourceFiles")?);
        }
        if let Some(v) = object.get("directTemplateLoading") {
            builder = builder.direct_template_loading(bool_field(v, "directTemplateLoading")?);
        }
        if let Some(v) = object.get("caseSensitive") {
            builder = builder.case_sensitive(bool_field(v, "caseSensitive")?);
        }
        Ok(builder.build())
    }
}

fn bool_field(value: &JsonValue, field: &'static str) -> Result<bool, ConfigError> {
    value.as_bool().ok_or(ConfigError::InvalidField {
        field,
        expected: "boolean",
    })
}

/// Configuration builder for fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    base_dir: Option<String>,
    cache_source_files: Option<bool>,
    direct_template_loading: Option<bool>,
    case_sensitive: Option<bool>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base directory. Default: `/`.
    pub fn base_dir(mut self, dir: impl Into<String>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Enable or disable the parsed source cache. Default: enabled.
    pub fn cache_source_files(mut self, enabled: bool) -> Self {
        self.cache_source_files = Some(enabled);
        self
    }

    /// Enable or disable direct template loading. Default: disabled.
    pub fn direct_template_loading(mut self, enabled: bool) -> Self {
        self.direct_template_loading = Some(enabled);
        self
    }

    /// Override case sensitivity. Default: derived from the platform.
    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case_sensitive = Some(sensitive);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Config {
        let defaults = Config::default();
        Config {
            base_dir: self.base_dir.unwrap_or(defaults.base_dir),
            cache_source_files: self.cache_source_files.unwrap_or(defaults.cache_source_files),
            direct_template_loading: self
                .direct_template_loading
                .unwrap_or(defaults.direct_template_loading),
            case_sensitive: self.case_sensitive.unwrap_or(defaults.case_sensitive),
        }
    }
}
