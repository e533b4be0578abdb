//! Redis-backed cache store (optional, feature `redis`).
//!
//! Keys are namespaced with a prefix so several catalogs can share one Redis.
//! TTLs are applied with `SET .. EX`; Redis owns expiry.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::instrument;

use super::r#trait::{CacheError, CacheStore};

pub const DEFAULT_NAMESPACE: &str = "catalog:";

/// Redis cache over a single multiplexed async connection.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: MultiplexedConnection,
    namespace: String,
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl RedisCacheStore {
    pub async fn connect(redis_url: impl AsRef<str>) -> Result<Self, CacheError> {
        Self::connect_with_namespace(redis_url, DEFAULT_NAMESPACE).await
    }

    pub async fn connect_with_namespace(
        redis_url: impl AsRef<str>,
        namespace: impl Into<String>,
    ) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(Self {
            conn,
            namespace: namespace.into(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }
}

/// Redis rejects `EX 0`; sub-second TTLs round up to one second.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    #[instrument(skip(self), err)]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(self.key(key))
            .query_async::<_, Option<Vec<u8>>>(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    #[instrument(skip(self, value), fields(bytes = value.len()), err)]
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(self.key(key))
            .arg(value)
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))
    }

    #[instrument(skip(self), err)]
    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(self.key(key))
            .query_async::<_, u64>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| CacheError::Backend(e.to_string()))
    }
}
