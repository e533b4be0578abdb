//! Key/value cache boundary used by the cache coordinator.
//!
//! Values are opaque bytes with a per-entry TTL. Expiry is owned by the cache
//! backend; callers only ever `get`, `set` and `evict`.

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod r#trait;

pub use in_memory::InMemoryCacheStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisCacheStore;
pub use r#trait::{CacheError, CacheKey, CacheStore};
