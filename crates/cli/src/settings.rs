//! `cachexp.toml` configuration file.
//!
//! # Example
//!
//! ```toml
//! [expand]
//! expand_key = "_expand"
//! placeholder_key = "_items"
//! max_depth = 2
//! exclude = ["self"]
//! exclude_prefixes = ["__"]
//!
//! [store]
//! dir = "/var/cache/catalog"
//! namespace = "catalog"
//! lowercase = true
//! write_through = false
//!
//! [origin]
//! base_url = "https://catalog.internal/cache"
//! timeout_ms = 2000
//! ```
//!
//! Every section is optional. Command-line flags override file values.

use std::path::{Path, PathBuf};

use cachexp_core::Config;
use cachexp_storage::{KeyNormalizer, OriginConfig};
use serde::{Deserialize, Serialize};

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub expand: Config,
    pub store: StoreSettings,
    pub origin: Option<OriginConfig>,
}

/// `[store]` section: where cached entries live and how keys are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct StoreSettings {
    /// Root directory of the entry files.
    pub dir: Option<PathBuf>,
    /// Namespace prepended to every key.
    pub namespace: Option<String>,
    /// Lowercase keys before lookup.
    pub lowercase: bool,
    /// Copy origin hits into `dir`.
    pub write_through: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            dir: None,
            namespace: None,
            lowercase: false,
            write_through: true,
        }
    }
}

impl StoreSettings {
    pub fn normalizer(&self) -> KeyNormalizer {
        KeyNormalizer {
            namespace: self.namespace.clone(),
            lowercase: self.lowercase,
        }
    }
}

/// Read and parse a settings file.
///
/// Returns a human-readable error string on failure.
pub(crate) fn read_settings(path: &Path) -> Result<Settings, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

/// Settings from `path`, or the defaults when no file was given.
pub(crate) fn load_settings(path: Option<&Path>) -> Result<Settings, String> {
    match path {
        Some(p) => read_settings(p),
        None => Ok(Settings::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let settings: Settings = toml::from_str(
            r#"
            [expand]
            expand_key = "$ref"
            max_depth = 1
            exclude = ["self"]

            [store]
            dir = "/tmp/cache"
            namespace = "shop"
            write_through = false

            [origin]
            base_url = "http://origin.local"
            timeout_ms = 750
            "#,
        )
        .unwrap();

        assert_eq!(settings.expand.expand_key, "$ref");
        assert_eq!(settings.expand.placeholder_key, "_items");
        assert_eq!(settings.expand.max_depth, 1);
        assert!(settings.expand.is_excluded("self"));
        assert_eq!(settings.store.dir, Some(PathBuf::from("/tmp/cache")));
        assert_eq!(settings.store.normalizer().normalize("p/1"), "shop/p/1");
        assert!(!settings.store.write_through);
        let origin = settings.origin.unwrap();
        assert_eq!(origin.base_url, "http://origin.local");
        assert_eq!(origin.timeout_ms, Some(750));
    }

    #[test]
    fn empty_file_is_default() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.origin.is_none());
        assert!(settings.store.write_through);
    }

    #[test]
    fn unreadable_file_reports_path() {
        let err = read_settings(Path::new("/nonexistent/cachexp.toml")).unwrap_err();
        assert!(err.contains("/nonexistent/cachexp.toml"), "{}", err);
    }
}
