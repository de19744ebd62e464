//! Suffix tables describing which memory-layer files derive from a source.

use crate::path::CanonicalPath;

/// Artifacts derived from sources with one suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRule {
    /// Source suffix, e.g. `.ts`.
    pub suffix: &'static str,
    /// Suffixes replacing `suffix` to name each derived artifact.
    pub derived: &'static [&'static str],
    /// Source variants that never cascade even though they end in `suffix`.
    pub exempt: &'static [&'static str],
}

/// Naming rules for generated content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRules {
    sources: Vec<SourceRule>,
    reemitted: &'static [&'static str],
    protected: &'static [&'static str],
    listed: &'static [&'static str],
}

/// TypeScript source layout with ahead-of-time template compilation.
const TYPESCRIPT: SourceRule = SourceRule {
    suffix: ".ts",
    derived: &[
        ".js",
        ".js.map",
        ".ngfactory.js",
        ".ngfactory.js.map",
        ".ngstyle.js",
        ".ngstyle.js.map",
        ".ngsummary.json",
    ],
    exempt: &[".ngfactory.ts", ".shim.ngstyle.ts"],
};

impl ArtifactRules {
    /// Build a rule set.
    ///
    /// - `sources`: cascade table, first matching suffix wins
    /// - `reemitted`: plain output suffixes cleared on every invalidation
    /// - `protected`: generated outputs exempt from that clearing
    /// - `listed`: generated outputs reported to downstream consumers
    pub fn new(
        sources: Vec<SourceRule>,
        reemitted: &'static [&'static str],
        protected: &'static [&'static str],
        listed: &'static [&'static str],
    ) -> Self {
        Self {
            sources,
            reemitted,
            protected,
            listed,
        }
    }

    /// Paths of every artifact derived from `source`.
    ///
    /// Empty if `source` has no recognized suffix or is an exempt variant.
    pub fn derived_paths(&self, source: &CanonicalPath) -> Vec<CanonicalPath> {
        let Some(rule) = self
            .sources
            .iter()
            .find(|rule| source.ends_with(rule.suffix))
        else {
            return Vec::new();
        };
        if rule.exempt.iter().any(|exempt| source.ends_with(exempt)) {
            return Vec::new();
        }
        rule.derived
            .iter()
            .filter_map(|derived| source.replace_suffix(rule.suffix, derived))
            .collect()
    }

    /// Whether `path` is a plain emitted output that must not survive into
    /// the next compile pass.
    pub fn is_reemitted(&self, path: &CanonicalPath) -> bool {
        self.reemitted.iter().any(|suffix| path.ends_with(suffix))
            && !self.protected.iter().any(|suffix| path.ends_with(suffix))
    }

    /// Whether `path` is a generated output reported downstream.
    pub fn is_listed_output(&self, path: &CanonicalPath) -> bool {
        self.listed.iter().any(|suffix| path.ends_with(suffix))
    }
}

impl Default for ArtifactRules {
    fn default() -> Self {
        Self::new(
            vec![TYPESCRIPT],
            &[".js", ".json"],
            &[".ngfactory.js", ".ngstyle.js", "ngsummary.json"],
            &[".ngfactory.js", ".ngstyle.js"],
        )
    }
}
