use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Entries older than this are treated as misses and evicted.
pub const DEFAULT_MAX_CACHE_AGE: Duration = Duration::from_secs(60 * 60);

pub const DEFAULT_EXCLUDE_PATTERNS: [&str; 3] = ["node_modules", "dist", "build"];

/// Settings for one analysis pass, fixed at construction and shared by the
/// extractor and the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    /// Relative paths containing any of these substrings are skipped.
    pub exclude_patterns: Vec<String>,
    pub cache_enabled: bool,
    #[serde(skip, default = "default_max_cache_age")]
    max_cache_age: Duration,
}

fn default_max_cache_age() -> Duration {
    DEFAULT_MAX_CACHE_AGE
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Overrides the cache time-to-live. Hosts normally keep the default.
    pub fn with_max_cache_age(mut self, max_age: Duration) -> Self {
        self.max_cache_age = max_age;
        self
    }

    pub fn max_cache_age(&self) -> Duration {
        self.max_cache_age
    }

    /// Substring match against a workspace-relative path, not glob semantics.
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| relative_path.contains(pattern.as_str()))
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
            cache_enabled: true,
            max_cache_age: DEFAULT_MAX_CACHE_AGE,
        }
    }
}
