use serde::{Deserialize, Serialize};

/// Maps logical keys onto canonical storage keys.
///
/// Whitespace and surrounding slashes are trimmed, repeated slashes are
/// collapsed, the key is optionally lowercased, and the namespace (if any)
/// is prepended. Normalizing an already normalized key is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyNormalizer {
    pub namespace: Option<String>,
    pub lowercase: bool,
}

impl KeyNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn normalize(&self, key: &str) -> String {
        let mut path = collapse(key);
        if self.lowercase {
            path = path.to_lowercase();
        }

        let namespace = match self.namespace.as_deref().map(collapse) {
            Some(ns) if !ns.is_empty() => {
                if self.lowercase {
                    ns.to_lowercase()
                } else {
                    ns
                }
            }
            _ => return path,
        };

        if path == namespace || path.starts_with(&format!("{}/", namespace)) {
            path
        } else if path.is_empty() {
            namespace
        } else {
            format!("{}/{}", namespace, path)
        }
    }
}

fn collapse(key: &str) -> String {
    key.trim()
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_collapses() {
        let n = KeyNormalizer::new();
        assert_eq!(n.normalize("  /product//v1/1/ "), "product/v1/1");
        assert_eq!(n.normalize("Product/V1"), "Product/V1");
    }

    #[test]
    fn lowercases_on_request() {
        let n = KeyNormalizer::new().lowercase(true);
        assert_eq!(n.normalize("Product/V1/ABC"), "product/v1/abc");
    }

    #[test]
    fn prefixes_namespace_once() {
        let n = KeyNormalizer::new().with_namespace("/cache/");
        assert_eq!(n.normalize("product/1"), "cache/product/1");
        assert_eq!(n.normalize("cache/product/1"), "cache/product/1");
        assert_eq!(n.normalize("cachexp/1"), "cache/cachexp/1");
    }

    #[test]
    fn normalization_is_idempotent() {
        let n = KeyNormalizer::new().with_namespace("Ns").lowercase(true);
        for key in ["A//b", " /ns/x/ ", "ns", "NS/Y", "plain"] {
            let once = n.normalize(key);
            assert_eq!(n.normalize(&once), once, "key {:?}", key);
        }
    }
}
