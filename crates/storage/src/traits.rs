use cachexp_core::Entries;

use crate::context::RequestContext;
use crate::error::StoreError;

/// A local cache of encoded entries, indexed by normalized key.
///
/// Implementations must be `Send + Sync`: a provider shares one store
/// across expansions and across the threads of a batched origin fetch.
pub trait CacheStore: Send + Sync {
    /// Read one entry. A missing key is `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Read many entries. Missing keys are absent from the result.
    ///
    /// The default loops over [`get`](CacheStore::get). A key the store
    /// cannot address ([`StoreError::InvalidKey`]) is treated as absent; any
    /// other error fails the call. Backends with a native multi-get should
    /// override it.
    fn get_many(&self, keys: &[String]) -> Result<Entries, StoreError> {
        let mut out = Entries::with_capacity(keys.len());
        for key in keys {
            match self.get(key) {
                Ok(Some(bytes)) => {
                    out.insert(key.clone(), bytes);
                }
                Ok(None) => {}
                Err(StoreError::InvalidKey { reason, .. }) => {
                    tracing::debug!(key = %key, reason = %reason, "skipping unaddressable key");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    /// Store (or replace) one entry.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

/// The remote source consulted when the local cache misses.
pub trait Origin: Send + Sync {
    /// Fetch one entry. `Ok(None)` means the origin does not know the key.
    fn fetch(&self, key: &str, ctx: &RequestContext) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Origin used when there is no remote source: every key is unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOrigin;

impl Origin for NoOrigin {
    fn fetch(&self, _key: &str, _ctx: &RequestContext) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(None)
    }
}
