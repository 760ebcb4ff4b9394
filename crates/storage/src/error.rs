/// All errors that can be returned by a cache store or an origin.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key cannot be mapped onto the backend (empty, path traversal, ...).
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Filesystem failure while reading or writing an entry.
    #[error("i/o error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The remote origin could not deliver the entry.
    #[error("origin fetch of '{key}' failed: {message}")]
    Origin { key: String, message: String },

    /// A backend-specific error (poisoned lock, bad configuration, etc.).
    #[error("store backend error: {0}")]
    Backend(String),
}
