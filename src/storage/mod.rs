//! Persistent storage for computed results.

mod cache;

pub use cache::{CacheError, CacheStore, CachedBundle};
