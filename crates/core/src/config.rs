//! Expansion configuration.
//!
//! A `Config` names the reserved fields the engine looks for, bounds the
//! recursion depth, and decides which named references are never resolved.
//! It is built once (from defaults, a TOML table, or by hand) and shared
//! read-only by every expansion.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Default field name marking a reference block.
pub const DEFAULT_EXPAND_KEY: &str = "_expand";
/// Default field name for a resolved list merged next to ordinary fields.
pub const DEFAULT_PLACEHOLDER_KEY: &str = "_items";
/// Default number of reference levels resolved below the root.
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Tuning knobs for an expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Field name marking a reference block.
    pub expand_key: String,
    /// Field name holding a resolved list next to ordinary fields.
    pub placeholder_key: String,
    /// Maximum number of reference fields resolved along any path.
    pub max_depth: u32,
    /// Reference names that are never resolved.
    pub exclude: BTreeSet<String>,
    /// Reference names starting with any of these prefixes are never resolved.
    pub exclude_prefixes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            expand_key: DEFAULT_EXPAND_KEY.to_string(),
            placeholder_key: DEFAULT_PLACEHOLDER_KEY.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            exclude: BTreeSet::new(),
            exclude_prefixes: Vec::new(),
        }
    }
}

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("expand key must not be empty")]
    EmptyExpandKey,

    #[error("placeholder key must not be empty")]
    EmptyPlaceholderKey,

    /// The placeholder would be read back as a reference block.
    #[error("expand key and placeholder key are both '{0}'")]
    KeyCollision(String),
}

impl Config {
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_expand_key(mut self, key: impl Into<String>) -> Self {
        self.expand_key = key.into();
        self
    }

    pub fn with_placeholder_key(mut self, key: impl Into<String>) -> Self {
        self.placeholder_key = key.into();
        self
    }

    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.exclude.insert(name.into());
        self
    }

    pub fn exclude_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.exclude_prefixes.push(prefix.into());
        self
    }

    /// Whether a named reference must be skipped during resolution.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.contains(name)
            || self
                .exclude_prefixes
                .iter()
                .any(|p| !p.is_empty() && name.starts_with(p.as_str()))
    }

    /// Check the reserved field names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expand_key.is_empty() {
            return Err(ConfigError::EmptyExpandKey);
        }
        if self.placeholder_key.is_empty() {
            return Err(ConfigError::EmptyPlaceholderKey);
        }
        if self.expand_key == self.placeholder_key {
            return Err(ConfigError::KeyCollision(self.expand_key.clone()));
        }
        Ok(())
    }
}
