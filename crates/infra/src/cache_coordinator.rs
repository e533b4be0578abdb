//! Cache-aside reads and write-through writes over a product store.
//!
//! ## Policy
//!
//! - Reads check the cache first; on a miss the store is read and the cache
//!   populated (`item:{id}` with the item TTL, `collection` with the collection TTL).
//! - Mutations hit the store first. Only after the store succeeds is the item
//!   entry written (or evicted on delete) and `collection` evicted wholesale.
//! - A failed or timed-out mutation may still have committed, so it evicts the
//!   entries it would have touched (`item:{id}` and `collection`) before the
//!   error is returned. A failed read leaves the cache untouched.
//!
//! ## Failure Semantics
//!
//! Cache errors, cache timeouts and undecodable payloads never reach callers.
//! Reads degrade to misses; writes and evictions are logged and counted.
//! Store errors and store timeouts are returned as [`StoreError`].
//!
//! ## Staleness
//!
//! A read miss fetches from the store and then populates the cache. A
//! mutation that writes through inside that window would be overwritten by the
//! pre-mutation row or set. Every mutation bumps a write generation before
//! its store call, and a read only populates when the generation it saw
//! before fetching is still current. The residual window is the gap between
//! that check and the cache write; an entry written there lives at most one
//! item TTL (`item:{id}`) or one collection TTL (`collection`). Coordinators
//! in other processes do not share the generation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use catalog_core::Entity;
use catalog_products::{NewProduct, Product, ProductId};

use crate::cache::{CacheError, CacheKey, CacheStore};
use crate::deadline;
use crate::product_store::{ProductStore, StoreError};

pub const DEFAULT_ITEM_TTL: Duration = Duration::from_secs(600);
pub const DEFAULT_COLLECTION_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// TTLs and per-call time limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub item_ttl: Duration,
    pub collection_ttl: Duration,
    pub cache_timeout: Duration,
    pub store_timeout: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            item_ttl: DEFAULT_ITEM_TTL,
            collection_ttl: DEFAULT_COLLECTION_TTL,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

/// Snapshot of coordinator counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub evictions: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    evictions: AtomicU64,
    failures: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Serialized cache payload.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    cached_at: DateTime<Utc>,
    value: T,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CacheError> {
    serde_json::to_vec(&Envelope {
        cached_at: Utc::now(),
        value,
    })
    .map_err(|e| CacheError::Codec(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Envelope<T>, CacheError> {
    serde_json::from_slice(bytes).map_err(|e| CacheError::Codec(e.to_string()))
}

/// Keeps the item and collection caches coherent with store writes.
pub struct CacheCoordinator<S, C> {
    store: S,
    cache: C,
    policy: CachePolicy,
    counters: Counters,
    generation: AtomicU64,
}

impl<S, C> CacheCoordinator<S, C> {
    pub fn new(store: S, cache: C, policy: CachePolicy) -> Self {
        Self {
            store,
            cache,
            policy,
            counters: Counters::default(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

impl<S, C> CacheCoordinator<S, C>
where
    S: ProductStore,
    C: CacheStore,
{
    /// The full product set, served from `collection` when present.
    #[instrument(skip(self), err)]
    pub async fn read_all(&self) -> Result<Vec<Product>, StoreError> {
        if let Some(products) = self.cached::<Vec<Product>>(CacheKey::Collection).await {
            return Ok(products);
        }

        let seen = self.generation();
        let products = self.store_call("find_all", self.store.find_all()).await?;
        if self.unchanged_since(seen) {
            self.populate(CacheKey::Collection, &products, self.policy.collection_ttl)
                .await;
        }
        Ok(products)
    }

    /// One product, served from `item:{id}` when present. Absent ids are not cached.
    #[instrument(skip(self), fields(id = %id), err)]
    pub async fn read_one(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let key = CacheKey::Item(id);
        if let Some(product) = self.cached::<Product>(key).await {
            return Ok(Some(product));
        }

        let seen = self.generation();
        let found = self.store_call("find_by_id", self.store.find_by_id(id)).await?;
        if let Some(product) = &found {
            if self.unchanged_since(seen) {
                self.populate(key, product, self.policy.item_ttl).await;
            }
        }
        Ok(found)
    }

    #[instrument(skip(self, product), err)]
    pub async fn create(&self, product: NewProduct) -> Result<Product, StoreError> {
        self.begin_write();
        let id = match self.store_call("insert", self.store.insert(product.clone())).await {
            Ok(id) => id,
            Err(error) => {
                self.evict(CacheKey::Collection).await;
                return Err(error);
            }
        };
        let created = Product::from_new(id, product);

        self.populate(CacheKey::Item(id), &created, self.policy.item_ttl)
            .await;
        self.evict(CacheKey::Collection).await;
        Ok(created)
    }

    #[instrument(skip(self, product), fields(id = %id), err)]
    pub async fn update(&self, id: ProductId, product: NewProduct) -> Result<Product, StoreError> {
        self.begin_write();
        match self.store_call("update", self.store.update(id, product)).await {
            Ok(updated) => {
                self.write_through(&updated).await;
                Ok(updated)
            }
            Err(error) => Err(self.evict_after_failure(id, error).await),
        }
    }

    /// Persist an already-merged product under `id`.
    #[instrument(skip(self, product), fields(id = %id), err)]
    pub async fn partial_update(&self, id: ProductId, product: Product) -> Result<Product, StoreError> {
        self.begin_write();
        match self
            .store_call("update", self.store.update(id, product.to_new()))
            .await
        {
            Ok(updated) => {
                self.write_through(&updated).await;
                Ok(updated)
            }
            Err(error) => Err(self.evict_after_failure(id, error).await),
        }
    }

    #[instrument(skip(self), fields(id = %id), err)]
    pub async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        self.begin_write();
        if let Err(error) = self.store_call("delete", self.store.delete(id)).await {
            return Err(self.evict_after_failure(id, error).await);
        }
        self.evict(CacheKey::Item(id)).await;
        self.evict(CacheKey::Collection).await;
        Ok(())
    }

    async fn write_through(&self, product: &Product) {
        self.populate(CacheKey::Item(product.id()), product, self.policy.item_ttl)
            .await;
        self.evict(CacheKey::Collection).await;
    }

    /// The store may have applied the write before failing.
    async fn evict_after_failure(&self, id: ProductId, error: StoreError) -> StoreError {
        warn!(id = %id, %error, "store mutation failed; evicting affected entries");
        self.evict(CacheKey::Item(id)).await;
        self.evict(CacheKey::Collection).await;
        error
    }

    fn begin_write(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn unchanged_since(&self, seen: u64) -> bool {
        let unchanged = self.generation() == seen;
        if !unchanged {
            debug!("write raced the read; skipping cache populate");
        }
        unchanged
    }

    async fn store_call<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: std::future::Future<Output = Result<T, StoreError>>,
    {
        deadline::within(self.policy.store_timeout, fut, || StoreError::Timeout(operation)).await
    }

    async fn cached<T: DeserializeOwned>(&self, key: CacheKey) -> Option<T> {
        let rendered = key.to_string();
        let lookup = deadline::within(self.policy.cache_timeout, self.cache.get(&rendered), || {
            CacheError::Timeout("get")
        })
        .await;

        let bytes = match lookup {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                Counters::bump(&self.counters.misses);
                debug!(key = %rendered, "cache miss");
                return None;
            }
            Err(error) => {
                Counters::bump(&self.counters.failures);
                Counters::bump(&self.counters.misses);
                warn!(key = %rendered, %error, "cache read failed; treating as miss");
                return None;
            }
        };

        match decode::<T>(&bytes) {
            Ok(envelope) => {
                Counters::bump(&self.counters.hits);
                let age_ms = (Utc::now() - envelope.cached_at).num_milliseconds();
                debug!(key = %rendered, age_ms, "cache hit");
                Some(envelope.value)
            }
            Err(error) => {
                Counters::bump(&self.counters.failures);
                Counters::bump(&self.counters.misses);
                warn!(key = %rendered, %error, "cache payload undecodable; treating as miss");
                None
            }
        }
    }

    async fn populate<T: Serialize>(&self, key: CacheKey, value: &T, ttl: Duration) {
        let rendered = key.to_string();
        let result = match encode(value) {
            Ok(bytes) => {
                deadline::within(
                    self.policy.cache_timeout,
                    self.cache.set(&rendered, bytes, ttl),
                    || CacheError::Timeout("set"),
                )
                .await
            }
            Err(error) => Err(error),
        };

        match result {
            Ok(()) => Counters::bump(&self.counters.writes),
            Err(error) => {
                Counters::bump(&self.counters.failures);
                warn!(key = %rendered, %error, "cache write failed");
            }
        }
    }

    async fn evict(&self, key: CacheKey) {
        let rendered = key.to_string();
        let result = deadline::within(self.policy.cache_timeout, self.cache.evict(&rendered), || {
            CacheError::Timeout("evict")
        })
        .await;

        match result {
            Ok(()) => Counters::bump(&self.counters.evictions),
            Err(error) => {
                Counters::bump(&self.counters.failures);
                warn!(key = %rendered, %error, "cache eviction failed");
            }
        }
    }
}
