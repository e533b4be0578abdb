use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use catalog_products::ProductId;

/// Cache operation error.
///
/// Never surfaced to catalog callers: a failed read is a miss, a failed write
/// or eviction is logged and dropped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache call '{0}' timed out")]
    Timeout(&'static str),

    #[error("cache backend failure: {0}")]
    Backend(String),

    #[error("cache payload could not be decoded: {0}")]
    Codec(String),
}

/// Cache namespaces.
///
/// `Collection` holds the entire unfiltered product set and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Item(ProductId),
    Collection,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Item(id) => write!(f, "item:{id}"),
            CacheKey::Collection => f.write_str("collection"),
        }
    }
}

/// TTL-aware key/value store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns `None` for absent or expired keys.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Evicting an absent key is not an error.
    async fn evict(&self, key: &str) -> Result<(), CacheError>;
}

#[async_trait]
impl<C> CacheStore for Arc<C>
where
    C: CacheStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        (**self).set(key, value, ttl).await
    }

    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        (**self).evict(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_render_their_namespace() {
        assert_eq!(CacheKey::Item(ProductId::new(7)).to_string(), "item:7");
        assert_eq!(CacheKey::Collection.to_string(), "collection");
    }
}
