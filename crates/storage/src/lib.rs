//! cachexp-storage: the JSON provider used by the `cachexp` tool.
//!
//! [`CacheProvider`] implements [`cachexp_core::Provider`] on top of a local
//! [`CacheStore`] ([`MemoryStore`], [`DirStore`]) with an optional remote
//! [`Origin`] ([`HttpOrigin`]) consulted on cache misses.

pub mod conformance;
mod context;
mod dir;
mod error;
mod memory;
mod normalize;
mod origin;
mod provider;
mod traits;

pub use context::RequestContext;
pub use dir::DirStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use normalize::KeyNormalizer;
pub use origin::{HttpOrigin, OriginConfig, DEFAULT_ORIGIN_TIMEOUT};
pub use provider::CacheProvider;
pub use traits::{CacheStore, NoOrigin, Origin};
