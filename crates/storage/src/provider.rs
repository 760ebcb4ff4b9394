//! JSON [`Provider`] over a local [`CacheStore`] with an optional [`Origin`].

use std::collections::HashSet;

use cachexp_core::{BatchError, Config, Entries, Provider, ProviderError};
use rayon::prelude::*;
use serde_json::Value;

use crate::context::RequestContext;
use crate::normalize::KeyNormalizer;
use crate::traits::{CacheStore, NoOrigin, Origin};

/// Serves expansions from a local store, falling back to an origin.
///
/// Entries are JSON. Every key is normalized before it touches the store or
/// the origin, and entries fetched from the origin are written back to the
/// store unless write-through is disabled.
pub struct CacheProvider<S, O = NoOrigin> {
    store: S,
    origin: O,
    normalizer: KeyNormalizer,
    config: Config,
    write_through: bool,
}

impl<S: CacheStore> CacheProvider<S, NoOrigin> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store,
            origin: NoOrigin,
            normalizer: KeyNormalizer::default(),
            config,
            write_through: true,
        }
    }
}

impl<S: CacheStore, O: Origin> CacheProvider<S, O> {
    pub fn with_origin<T: Origin>(self, origin: T) -> CacheProvider<S, T> {
        CacheProvider {
            store: self.store,
            origin,
            normalizer: self.normalizer,
            config: self.config,
            write_through: self.write_through,
        }
    }

    pub fn with_normalizer(mut self, normalizer: KeyNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn write_through(mut self, enabled: bool) -> Self {
        self.write_through = enabled;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn origin(&self) -> &O {
        &self.origin
    }

    /// Local cache lookup. A failing store counts as a miss.
    fn local(&self, key: &str) -> Option<Vec<u8>> {
        match self.store.get(key) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(key, error = %e, "local store read failed");
                None
            }
        }
    }

    fn remember(&self, key: &str, bytes: &[u8]) {
        if !self.write_through {
            return;
        }
        if let Err(e) = self.store.put(key, bytes) {
            tracing::warn!(key, error = %e, "could not write origin entry to local store");
        }
    }
}

impl<S: CacheStore, O: Origin> Provider for CacheProvider<S, O> {
    type Context = RequestContext;

    fn serialize(&self, value: &Value) -> Result<Vec<u8>, ProviderError> {
        serde_json::to_vec(value).map_err(|e| ProviderError::Encode(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, ProviderError> {
        serde_json::from_slice(bytes).map_err(|e| ProviderError::Decode(e.to_string()))
    }

    fn read_one(&self, key: &str, ctx: &RequestContext) -> Result<Vec<u8>, ProviderError> {
        let normalized = self.normalize(key);
        if let Some(bytes) = self.local(&normalized) {
            return Ok(bytes);
        }

        match self.origin.fetch(&normalized, ctx) {
            Ok(Some(bytes)) => {
                self.remember(&normalized, &bytes);
                Ok(bytes)
            }
            Ok(None) => Err(ProviderError::NotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(ProviderError::Fetch {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn read_many(&self, keys: &[String], ctx: &RequestContext) -> Result<Entries, BatchError> {
        let mut seen = HashSet::with_capacity(keys.len());
        let normalized: Vec<String> = keys
            .iter()
            .map(|k| self.normalize(k))
            .filter(|k| seen.insert(k.clone()))
            .collect();

        let mut entries = match self.store.get_many(&normalized) {
            Ok(entries) => entries,
            Err(e) => {
                // Retry key by key so one bad entry does not hide its siblings.
                tracing::warn!(keys = normalized.len(), error = %e, "local batch read failed");
                normalized
                    .iter()
                    .filter_map(|k| self.local(k).map(|bytes| (k.clone(), bytes)))
                    .collect()
            }
        };

        let misses: Vec<&String> = normalized
            .iter()
            .filter(|k| !entries.contains_key(k.as_str()))
            .collect();
        if misses.is_empty() {
            return Ok(entries);
        }

        tracing::debug!(
            hits = entries.len(),
            misses = misses.len(),
            "fetching batch misses from origin"
        );
        let fetched: Vec<_> = misses
            .par_iter()
            .map(|key| (*key, self.origin.fetch(key, ctx)))
            .collect();

        let mut failures = Vec::new();
        for (key, result) in fetched {
            match result {
                Ok(Some(bytes)) => {
                    self.remember(key, &bytes);
                    entries.insert(key.clone(), bytes);
                }
                Ok(None) => {}
                Err(e) => failures.push((key, e)),
            }
        }

        let source = match failures.len() {
            0 => return Ok(entries),
            1 => {
                let (key, e) = &failures[0];
                ProviderError::Fetch {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            }
            n => ProviderError::Backend(format!(
                "{} of {} origin fetches failed, first: {}",
                n,
                misses.len(),
                failures[0].1
            )),
        };

        Err(BatchError {
            partial: entries,
            source,
        })
    }

    fn normalize(&self, key: &str) -> String {
        self.normalizer.normalize(key)
    }

    fn config(&self) -> &Config {
        &self.config
    }
}
