//! cachexp-core: reference expansion for compactly-stored cache entries.
//!
//! Cache entries often store related entries by key only. [`expand()`] walks
//! a decoded document, replaces every reference block (the field named by
//! [`Config::expand_key`]) with the content its keys point to, recursively
//! and up to [`Config::max_depth`] levels, and re-encodes the result.
//!
//! Fetching, key normalization and the wire codec all go through a
//! [`Provider`], so the engine itself is transport- and format-agnostic.
//!
//! Failure handling is best-effort: a missing related entry is dropped from
//! the output, a failed batch read is collected into [`ExpandErrors`], and
//! only an undecodable input aborts the expansion.

pub mod config;
pub mod engine;
pub mod error;
pub mod provider;

pub use config::{Config, ConfigError};
pub use engine::{expand, expand_value, Expanded};
pub use error::{BatchError, ExpandError, ExpandErrors, ProviderError};
pub use provider::{Entries, Provider};
