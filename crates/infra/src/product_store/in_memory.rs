use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use catalog_core::{Entity, Page, PageRequest, Sort, SortDirection, SortField};
use catalog_products::{NewProduct, Predicate, Product, ProductId};

use super::r#trait::{ProductStore, StoreError};

/// In-memory product store.
///
/// Intended for tests/dev. Ids start at 1 and are never reused.
#[derive(Debug)]
pub struct InMemoryProductStore {
    inner: RwLock<Rows>,
}

#[derive(Debug)]
struct Rows {
    next_id: i64,
    products: BTreeMap<ProductId, Product>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Rows {
                next_id: 1,
                products: BTreeMap::new(),
            }),
        }
    }

    /// Store pre-built rows as-is, keeping their ids (fixtures).
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products: BTreeMap<ProductId, Product> = products.into_iter().map(|p| (p.id(), p)).collect();
        let next_id = products.keys().last().map(|id| id.get() + 1).unwrap_or(1);
        Self {
            inner: RwLock::new(Rows { next_id, products }),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Rows>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Rows>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

fn compare(a: &Product, b: &Product, sort: Sort) -> Ordering {
    let primary = match sort.field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Quantity => a.quantity.cmp(&b.quantity),
    };
    let primary = match sort.direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, product: NewProduct) -> Result<ProductId, StoreError> {
        let mut rows = self.write()?;
        let id = ProductId::new(rows.next_id);
        rows.next_id += 1;
        rows.products.insert(id, Product::from_new(id, product));
        Ok(id)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn update(&self, id: ProductId, product: NewProduct) -> Result<Product, StoreError> {
        let mut rows = self.write()?;
        let slot = rows.products.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        *slot = Product::from_new(id, product);
        Ok(slot.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        self.write()?
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.read()?.products.values().cloned().collect())
    }

    async fn find_page(&self, predicate: &Predicate, page: &PageRequest) -> Result<Page<Product>, StoreError> {
        let mut matching: Vec<Product> = self
            .read()?
            .products
            .values()
            .filter(|p| predicate.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| compare(a, b, page.sort));

        let total = matching.len() as u64;
        let start = usize::try_from(page.offset()).unwrap_or(usize::MAX).min(matching.len());
        let content = matching
            .into_iter()
            .skip(start)
            .take(page.size as usize)
            .collect();

        Ok(Page::new(content, page, total))
    }

    async fn find_matching(&self, predicate: &Predicate) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .read()?
            .products
            .values()
            .filter(|p| predicate.matches(p))
            .cloned()
            .collect())
    }
}
