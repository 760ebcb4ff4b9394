use std::collections::HashMap;
use std::sync::RwLock;

use cachexp_core::Entries;

use crate::error::StoreError;
use crate::traits::CacheStore;

/// Process-local store backed by a `HashMap`.
///
/// Keys are stored exactly as given; callers pass normalized keys.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-filled with JSON documents.
    pub fn from_json<I, K>(docs: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: Into<String>,
    {
        let mut entries = HashMap::new();
        for (key, doc) in docs {
            let key = key.into();
            let bytes = serde_json::to_vec(&doc)
                .map_err(|e| StoreError::Backend(format!("could not encode '{}': {}", key, e)))?;
            entries.insert(key, bytes);
        }
        Ok(Self {
            entries: RwLock::new(entries),
        })
    }

    /// Number of entries, counted even after a writer panicked.
    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("memory store lock poisoned".to_string())
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn get_many(&self, keys: &[String]) -> Result<Entries, StoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(k).map(|b| (k.clone(), b.clone())))
            .collect())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.put("user/1", b"{\"id\":1}").unwrap();
        assert_eq!(store.get("user/1").unwrap(), Some(b"{\"id\":1}".to_vec()));
        assert_eq!(store.get("user/2").unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_many_skips_missing() {
        let store = MemoryStore::from_json([
            ("a", serde_json::json!({"v": 1})),
            ("b", serde_json::json!({"v": 2})),
        ])
        .unwrap();
        let keys = vec!["a".to_string(), "x".to_string(), "b".to_string()];
        let got = store.get_many(&keys).unwrap();
        assert_eq!(got.len(), 2);
        assert!(got.contains_key("a"));
        assert!(got.contains_key("b"));
    }

    #[test]
    fn len_counts_entries_of_poisoned_store() {
        let store = std::sync::Arc::new(
            MemoryStore::from_json([("a", serde_json::json!({"v": 1}))]).unwrap(),
        );
        let writer = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = writer.entries.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        assert!(matches!(store.get("a"), Err(StoreError::Backend(_))));
    }
}
