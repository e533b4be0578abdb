//! Catalog orchestration.
//!
//! Identity-based reads and writes go through the [`CacheCoordinator`].
//! Filtered search and the single-field lookups bypass the cache and query the
//! store directly with a predicate built from [`FilterCriteria`].
//!
//! Every validation runs before the first store or cache call. Mutations on an
//! unknown id fail with `NotFound` after a single store read and touch nothing.

use std::time::Duration;

use thiserror::Error;
use tracing::instrument;

use catalog_core::{DomainError, Page, PageRequest};
use catalog_products::{
    DefaultProductMapper, FilterCriteria, Product, ProductDto, ProductId, ProductMapper, build_predicate,
};

use crate::cache::CacheStore;
use crate::cache_coordinator::{CacheCoordinator, CachePolicy, CacheStats};
use crate::deadline;
use crate::product_store::{ProductStore, StoreError};

/// Errors surfaced to catalog callers. Cache failures never appear here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("product {0} not found")]
    NotFound(ProductId),

    #[error("dependency unavailable: {0}")]
    Dependency(StoreError),
}

impl From<DomainError> for CatalogError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => CatalogError::Validation(msg),
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => CatalogError::NotFound(id),
            other => CatalogError::Dependency(other),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

pub struct CatalogService<S, C, M = DefaultProductMapper> {
    store: S,
    coordinator: CacheCoordinator<S, C>,
    mapper: M,
    store_timeout: Duration,
}

impl<S, C> CatalogService<S, C, DefaultProductMapper>
where
    S: Clone,
{
    pub fn new(store: S, cache: C, policy: CachePolicy) -> Self {
        Self::with_mapper(store, cache, policy, DefaultProductMapper)
    }
}

impl<S, C, M> CatalogService<S, C, M>
where
    S: Clone,
{
    pub fn with_mapper(store: S, cache: C, policy: CachePolicy, mapper: M) -> Self {
        Self {
            store: store.clone(),
            coordinator: CacheCoordinator::new(store, cache, policy),
            mapper,
            store_timeout: policy.store_timeout,
        }
    }
}

impl<S, C, M> CatalogService<S, C, M> {
    pub fn cache_stats(&self) -> CacheStats {
        self.coordinator.stats()
    }
}

impl<S, C, M> CatalogService<S, C, M>
where
    S: ProductStore,
    C: CacheStore,
    M: ProductMapper,
{
    #[instrument(skip(self), err)]
    pub async fn get_all(&self) -> CatalogResult<Vec<ProductDto>> {
        let products = self.coordinator.read_all().await?;
        Ok(self.to_transfer_all(&products))
    }

    #[instrument(skip(self), fields(id = %id), err)]
    pub async fn get_by_id(&self, id: ProductId) -> CatalogResult<Option<ProductDto>> {
        let product = self.coordinator.read_one(id).await?;
        Ok(product.map(|p| self.mapper.to_transfer(&p)))
    }

    #[instrument(skip(self, dto), err)]
    pub async fn create(&self, dto: ProductDto) -> CatalogResult<ProductDto> {
        let new = self.mapper.to_entity(dto)?;
        let created = self.coordinator.create(new).await?;
        Ok(self.mapper.to_transfer(&created))
    }

    /// Replace every attribute of an existing product.
    #[instrument(skip(self, dto), fields(id = %id), err)]
    pub async fn update(&self, id: ProductId, dto: ProductDto) -> CatalogResult<ProductDto> {
        let replacement = self.mapper.to_entity(dto)?;
        self.require(id).await?;
        let updated = self.coordinator.update(id, replacement).await?;
        Ok(self.mapper.to_transfer(&updated))
    }

    /// Overwrite only the fields `dto` provides.
    #[instrument(skip(self, dto), fields(id = %id), err)]
    pub async fn partial_update(&self, id: ProductId, dto: ProductDto) -> CatalogResult<ProductDto> {
        self.mapper.check_patch(&dto)?;
        let mut current = self.require(id).await?;
        self.mapper.merge_non_null(dto, &mut current)?;
        let updated = self.coordinator.partial_update(id, current).await?;
        Ok(self.mapper.to_transfer(&updated))
    }

    #[instrument(skip(self), fields(id = %id), err)]
    pub async fn delete(&self, id: ProductId) -> CatalogResult<()> {
        self.require(id).await?;
        self.coordinator.delete(id).await?;
        Ok(())
    }

    /// Filtered, paginated search. Never reads or writes the cache.
    #[instrument(skip(self, criteria), fields(page = page.page, size = page.size), err)]
    pub async fn search(&self, criteria: &FilterCriteria, page: &PageRequest) -> CatalogResult<Page<ProductDto>> {
        criteria.validate()?;
        let predicate = build_predicate(criteria);
        let found = deadline::within(self.store_timeout, self.store.find_page(&predicate, page), || {
            StoreError::Timeout("find_page")
        })
        .await?;
        Ok(found.map(|p| self.mapper.to_transfer(&p)))
    }

    pub async fn find_by_name(&self, name: &str) -> CatalogResult<Vec<ProductDto>> {
        self.find_matching(FilterCriteria::by_name(name)).await
    }

    pub async fn find_by_description(&self, description: &str) -> CatalogResult<Vec<ProductDto>> {
        self.find_matching(FilterCriteria::by_description(description))
            .await
    }

    pub async fn find_by_category(&self, category: &str) -> CatalogResult<Vec<ProductDto>> {
        self.find_matching(FilterCriteria::by_category(category))
            .await
    }

    pub async fn find_by_price_between(&self, min: f64, max: f64) -> CatalogResult<Vec<ProductDto>> {
        self.find_matching(FilterCriteria::by_price_between(min, max))
            .await
    }

    #[instrument(skip(self), err)]
    async fn find_matching(&self, criteria: FilterCriteria) -> CatalogResult<Vec<ProductDto>> {
        criteria.validate()?;
        let predicate = build_predicate(&criteria);
        let products = deadline::within(self.store_timeout, self.store.find_matching(&predicate), || {
            StoreError::Timeout("find_matching")
        })
        .await?;
        Ok(self.to_transfer_all(&products))
    }

    /// Current stored value of `id`, read from the store and not the cache.
    async fn require(&self, id: ProductId) -> CatalogResult<Product> {
        deadline::within(self.store_timeout, self.store.find_by_id(id), || {
            StoreError::Timeout("find_by_id")
        })
        .await?
        .ok_or(CatalogError::NotFound(id))
    }

    fn to_transfer_all(&self, products: &[Product]) -> Vec<ProductDto> {
        products.iter().map(|p| self.mapper.to_transfer(p)).collect()
    }
}
