//! The collaborator interface the engine fetches and (de)serializes through.

use std::collections::HashMap;

use serde_json::Value;

use crate::config::Config;
use crate::error::{BatchError, ProviderError};

/// Result of a batched read, indexed by normalized key.
pub type Entries = HashMap<String, Vec<u8>>;

/// Supplies raw cache entries, the wire codec and the expansion config.
///
/// The engine never interprets `Context`; it forwards the caller's value
/// to every fetch so implementations can apply deadlines, cancellation or
/// request headers when falling back to a remote source.
///
/// Implementations must be `Send + Sync` so one provider can serve
/// expansions from many threads.
pub trait Provider: Send + Sync {
    /// Per-request value forwarded unchanged to `read_one` and `read_many`.
    type Context;

    /// Encode a tree value into wire bytes.
    fn serialize(&self, value: &Value) -> Result<Vec<u8>, ProviderError>;

    /// Decode wire bytes into a tree value.
    fn deserialize(&self, bytes: &[u8]) -> Result<Value, ProviderError>;

    /// Read one entry, local cache first, remote source second.
    ///
    /// Fails when neither holds the key.
    fn read_one(&self, key: &str, ctx: &Self::Context) -> Result<Vec<u8>, ProviderError>;

    /// Read many entries in one batch.
    ///
    /// The result is indexed by [`normalize`](Provider::normalize)d key.
    /// Keys that are simply unavailable are absent from the map; that is not
    /// an error. A failed batch returns a [`BatchError`] carrying whatever was
    /// read anyway.
    fn read_many(&self, keys: &[String], ctx: &Self::Context) -> Result<Entries, BatchError>;

    /// Canonical form of `key`, as used to index `read_many` results.
    fn normalize(&self, key: &str) -> String;

    fn config(&self) -> &Config;
}
