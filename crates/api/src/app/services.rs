//! Infrastructure wiring: pick store and cache backends from configuration.

use std::sync::Arc;

use anyhow::Context;

use catalog_infra::cache::{CacheStore, InMemoryCacheStore};
use catalog_infra::product_store::{InMemoryProductStore, PostgresProductStore, ProductStore};
use catalog_infra::{CatalogConfig, CatalogService};

#[cfg(feature = "redis")]
use catalog_infra::cache::RedisCacheStore;

/// Catalog service over type-erased backends.
pub type Catalog = CatalogService<Arc<dyn ProductStore>, Arc<dyn CacheStore>>;

#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<Catalog>,
    pub max_page_size: u32,
}

impl AppServices {
    pub fn new(store: Arc<dyn ProductStore>, cache: Arc<dyn CacheStore>, config: &CatalogConfig) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(store, cache, config.cache_policy())),
            max_page_size: config.max_page_size,
        }
    }
}

/// In-memory store and cache; nothing external is contacted.
pub fn in_memory_services(config: &CatalogConfig) -> AppServices {
    AppServices::new(
        Arc::new(InMemoryProductStore::new()),
        Arc::new(InMemoryCacheStore::new()),
        config,
    )
}

/// Connect the configured backends. Unset URLs fall back to in-memory backends.
pub async fn build_services(config: &CatalogConfig) -> anyhow::Result<AppServices> {
    let store = build_store(config).await?;
    let cache = build_cache(config).await?;
    Ok(AppServices::new(store, cache, config))
}

async fn build_store(config: &CatalogConfig) -> anyhow::Result<Arc<dyn ProductStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using in-memory product store");
        return Ok(Arc::new(InMemoryProductStore::new()));
    };

    let store = PostgresProductStore::connect(database_url, config.store_timeout)
        .await
        .context("failed to connect to Postgres")?;
    store
        .ensure_schema()
        .await
        .context("failed to prepare products table")?;
    tracing::info!("using Postgres product store");
    Ok(Arc::new(store))
}

#[cfg(feature = "redis")]
async fn build_cache(config: &CatalogConfig) -> anyhow::Result<Arc<dyn CacheStore>> {
    let Some(redis_url) = config.redis_url.as_deref() else {
        tracing::info!("REDIS_URL not set; using in-memory cache");
        return Ok(Arc::new(InMemoryCacheStore::new()));
    };

    let cache = RedisCacheStore::connect(redis_url)
        .await
        .context("failed to connect to Redis")?;
    tracing::info!("using Redis cache");
    Ok(Arc::new(cache))
}

#[cfg(not(feature = "redis"))]
async fn build_cache(config: &CatalogConfig) -> anyhow::Result<Arc<dyn CacheStore>> {
    if config.redis_url.is_some() {
        anyhow::bail!("REDIS_URL is set but catalog-api was built without the `redis` feature");
    }
    Ok(Arc::new(InMemoryCacheStore::new()))
}
