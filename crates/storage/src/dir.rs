use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::StoreError;
use crate::traits::CacheStore;

/// Store keeping one file per entry under a root directory.
///
/// Key `product/v1/1` lives at `<root>/product/v1/1.json`.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for `key`, rejecting keys that would escape the root.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let invalid = |reason: &str| StoreError::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        if key.is_empty() {
            return Err(invalid("empty key"));
        }
        if key.contains('\\') || key.contains('\0') {
            return Err(invalid("contains a backslash or NUL byte"));
        }

        if key.split('/').any(|s| s == "." || s == "..") {
            return Err(invalid("contains a '.' or '..' segment"));
        }
        if !Path::new(key)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(invalid("must be a relative path"));
        }

        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl CacheStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io {
                key: key.to_string(),
                source: e,
            }),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&path, bytes).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        store.put("product/v1/1", b"{\"id\":1}").unwrap();

        assert!(dir.path().join("product/v1/1.json").is_file());
        assert_eq!(
            store.get("product/v1/1").unwrap(),
            Some(b"{\"id\":1}".to_vec())
        );
        assert_eq!(store.get("product/v1/2").unwrap(), None);
    }

    #[test]
    fn rejects_escaping_keys() {
        let store = DirStore::new("/tmp/cachexp-unused");
        for key in ["", "../etc/passwd", "/etc/passwd", "a/./b", "a/../../b", "a\\b"] {
            match store.get(key) {
                Err(StoreError::InvalidKey { .. }) => {}
                other => panic!("key {:?}: expected InvalidKey, got {:?}", key, other),
            }
        }
    }
}
