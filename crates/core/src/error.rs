use std::fmt;

use crate::provider::Entries;

/// Errors reported by a [`Provider`](crate::Provider) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Bytes could not be decoded into a tree value.
    #[error("decode error: {0}")]
    Decode(String),

    /// A tree value could not be encoded into bytes.
    #[error("encode error: {0}")]
    Encode(String),

    /// Neither the local cache nor the remote source holds the key.
    #[error("key not found: {key}")]
    NotFound { key: String },

    /// The fetch for a single key failed.
    #[error("fetch of '{key}' failed: {message}")]
    Fetch { key: String, message: String },

    /// A backend-specific failure not tied to one key.
    #[error("provider backend error: {0}")]
    Backend(String),
}

/// A batched read that failed as a whole.
///
/// Entries that were still read before (or despite) the failure are carried
/// in `partial` and stay usable.
#[derive(Debug, Clone, thiserror::Error)]
#[error("batch read failed: {source}")]
pub struct BatchError {
    pub partial: Entries,
    #[source]
    pub source: ProviderError,
}

impl BatchError {
    /// A failed batch that produced nothing.
    pub fn empty(source: ProviderError) -> Self {
        Self {
            partial: Entries::new(),
            source,
        }
    }
}

impl From<ProviderError> for BatchError {
    fn from(source: ProviderError) -> Self {
        Self::empty(source)
    }
}

/// A single failure recorded during an expansion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExpandError {
    /// The input document could not be decoded. Fatal: nothing is expanded.
    #[error("input decode failed: {0}")]
    Decode(#[source] ProviderError),

    /// A batched read for a list reference failed.
    #[error("batch fetch of {} key(s) failed: {source}", keys.len())]
    BatchFetch {
        keys: Vec<String>,
        #[source]
        source: ProviderError,
    },

    /// The expanded document could not be encoded.
    #[error("output encode failed: {0}")]
    Encode(#[source] ProviderError),
}

/// Aggregate of every non-fatal error collected during one expansion.
///
/// Merging is associative and never drops an entry, so sub-results can be
/// combined in any grouping.
#[derive(Debug, Clone, Default)]
pub struct ExpandErrors {
    errors: Vec<ExpandError>,
}

impl ExpandErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ExpandError) {
        self.errors.push(error);
    }

    /// Append every error of `other`.
    pub fn merge(&mut self, other: ExpandErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExpandError> {
        self.errors.iter()
    }

    /// `Ok(())` when nothing went wrong, the aggregate otherwise.
    pub fn into_result(self) -> Result<(), ExpandErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ExpandErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            0 => write!(f, "no errors"),
            1 => write!(f, "1 error occurred: {}", self.errors[0]),
            n => {
                write!(f, "{} errors occurred:", n)?;
                for e in &self.errors {
                    write!(f, "\n  * {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ExpandErrors {}

impl From<ExpandError> for ExpandErrors {
    fn from(error: ExpandError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl Extend<ExpandError> for ExpandErrors {
    fn extend<T: IntoIterator<Item = ExpandError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for ExpandErrors {
    type Item = ExpandError;
    type IntoIter = std::vec::IntoIter<ExpandError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ExpandErrors {
    type Item = &'a ExpandError;
    type IntoIter = std::slice::Iter<'a, ExpandError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
