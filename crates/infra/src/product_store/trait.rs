use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use catalog_core::{Page, PageRequest};
use catalog_products::{NewProduct, Predicate, Product, ProductId};

/// Backing store operation error.
///
/// These are **infrastructure errors** (availability, timeouts, missing rows)
/// as opposed to domain errors (validation).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store call '{0}' timed out")]
    Timeout(&'static str),

    #[error("store backend failure: {0}")]
    Backend(String),

    #[error("product {0} not found in store")]
    NotFound(ProductId),
}

/// Durable product storage.
///
/// Implementations must provide atomic single-row reads and writes; the catalog
/// adds no locking on top. Identities are assigned here and nowhere else.
///
/// ## Predicates
///
/// `find_page` and `find_matching` receive an opaque [`Predicate`]. Relational
/// backends translate its clauses into their query language; others may evaluate
/// [`Predicate::matches`] row by row.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Persist a new product and return its assigned identity.
    async fn insert(&self, product: NewProduct) -> Result<ProductId, StoreError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Replace all attributes of `id`. Returns `NotFound` if the row is gone.
    async fn update(&self, id: ProductId, product: NewProduct) -> Result<Product, StoreError>;

    /// Remove `id`. Returns `NotFound` if the row is gone.
    async fn delete(&self, id: ProductId) -> Result<(), StoreError>;

    /// The full, unfiltered product set ordered by id.
    async fn find_all(&self) -> Result<Vec<Product>, StoreError>;

    async fn find_page(&self, predicate: &Predicate, page: &PageRequest) -> Result<Page<Product>, StoreError>;

    /// Every row matching `predicate`, ordered by id.
    async fn find_matching(&self, predicate: &Predicate) -> Result<Vec<Product>, StoreError>;
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn insert(&self, product: NewProduct) -> Result<ProductId, StoreError> {
        (**self).insert(product).await
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn update(&self, id: ProductId, product: NewProduct) -> Result<Product, StoreError> {
        (**self).update(id, product).await
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }

    async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        (**self).find_all().await
    }

    async fn find_page(&self, predicate: &Predicate, page: &PageRequest) -> Result<Page<Product>, StoreError> {
        (**self).find_page(predicate, page).await
    }

    async fn find_matching(&self, predicate: &Predicate) -> Result<Vec<Product>, StoreError> {
        (**self).find_matching(predicate).await
    }
}
