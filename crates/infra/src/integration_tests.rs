//! Integration tests for the catalog pipeline.
//!
//! Tests: CatalogService → CacheCoordinator → CacheStore / ProductStore
//!
//! Verifies:
//! - Repeated reads are served from cache
//! - Every mutation leaves item and collection views fresh
//! - Validation and missing ids stop before any store or cache mutation
//! - Cache failures never surface; store failures do

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use catalog_core::{Page, PageRequest};
    use catalog_products::{FilterCriteria, NewProduct, Predicate, Product, ProductDto, ProductId};

    use crate::cache::{CacheError, CacheStore, InMemoryCacheStore};
    use crate::cache_coordinator::CachePolicy;
    use crate::catalog_service::{CatalogError, CatalogService};
    use crate::product_store::{InMemoryProductStore, ProductStore, StoreError};

    /// Store double that counts calls per operation.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryProductStore,
        reads: AtomicUsize,
        find_all: AtomicUsize,
        writes: AtomicUsize,
        find_all_delay: Option<Duration>,
        /// Applied after a write has reached the inner store.
        commit_delay: Option<Duration>,
        /// Holds the next `find_by_id` after it has read, until notified.
        read_gate: Mutex<Option<Arc<Notify>>>,
    }

    impl CountingStore {
        fn with_products(products: Vec<Product>) -> Self {
            Self {
                inner: InMemoryProductStore::with_products(products),
                ..Self::default()
            }
        }

        fn total_calls(&self) -> usize {
            self.reads.load(Ordering::SeqCst) + self.writes.load(Ordering::SeqCst)
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        fn gate_next_read(&self) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            *self.read_gate.lock().unwrap() = Some(gate.clone());
            gate
        }

        async fn acknowledge(&self) {
            if let Some(delay) = self.commit_delay {
                tokio::time::sleep(delay).await;
            }
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn find_all_calls(&self) -> usize {
            self.find_all.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProductStore for CountingStore {
        async fn insert(&self, product: NewProduct) -> Result<ProductId, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.insert(product).await
        }

        async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let found = self.inner.find_by_id(id).await;
            let gate = self.read_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            found
        }

        async fn update(&self, id: ProductId, product: NewProduct) -> Result<Product, StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let updated = self.inner.update(id, product).await;
            self.acknowledge().await;
            updated
        }

        async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let deleted = self.inner.delete(id).await;
            self.acknowledge().await;
            deleted
        }

        async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.find_all.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.find_all_delay {
                tokio::time::sleep(delay).await;
            }
            self.inner.find_all().await
        }

        async fn find_page(&self, predicate: &Predicate, page: &PageRequest) -> Result<Page<Product>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.find_page(predicate, page).await
        }

        async fn find_matching(&self, predicate: &Predicate) -> Result<Vec<Product>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.find_matching(predicate).await
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum CacheBehavior {
        Healthy,
        Failing,
        Slow,
    }

    /// Cache double that records every call and can be told to misbehave.
    struct RecordingCache {
        inner: InMemoryCacheStore,
        behavior: CacheBehavior,
        log: Mutex<Vec<String>>,
    }

    impl RecordingCache {
        fn new(behavior: CacheBehavior) -> Self {
            Self {
                inner: InMemoryCacheStore::new(),
                behavior,
                log: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        fn evictions(&self) -> Vec<String> {
            self.calls().into_iter().filter(|c| c.starts_with("evict")).collect()
        }

        async fn misbehave(&self, op: &'static str) -> Result<(), CacheError> {
            match self.behavior {
                CacheBehavior::Healthy => Ok(()),
                CacheBehavior::Failing => Err(CacheError::Backend(format!("{op} refused"))),
                CacheBehavior::Slow => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(())
                }
            }
        }
    }

    #[async_trait]
    impl CacheStore for RecordingCache {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            self.log.lock().unwrap().push(format!("get {key}"));
            self.misbehave("get").await?;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
            self.log.lock().unwrap().push(format!("set {key}"));
            self.misbehave("set").await?;
            self.inner.set(key, value, ttl).await
        }

        async fn evict(&self, key: &str) -> Result<(), CacheError> {
            self.log.lock().unwrap().push(format!("evict {key}"));
            self.misbehave("evict").await?;
            self.inner.evict(key).await
        }
    }

    type TestService = CatalogService<Arc<CountingStore>, Arc<RecordingCache>>;

    fn service_with(store: CountingStore, behavior: CacheBehavior) -> (TestService, Arc<CountingStore>, Arc<RecordingCache>) {
        let store = Arc::new(store);
        let cache = Arc::new(RecordingCache::new(behavior));
        let service = CatalogService::new(store.clone(), cache.clone(), CachePolicy::default());
        (service, store, cache)
    }

    fn product(id: i64, name: &str, category: &str, price: f64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: None,
            category: Some(category.to_string()),
            price,
            quantity: 1,
            image_url: None,
        }
    }

    fn dto(name: &str, price: f64) -> ProductDto {
        ProductDto {
            name: Some(name.to_string()),
            price: Some(price),
            ..ProductDto::default()
        }
    }

    fn ids(products: &[ProductDto]) -> Vec<i64> {
        products.iter().filter_map(|p| p.id).map(|id| id.get()).collect()
    }

    fn seeded() -> CountingStore {
        CountingStore::with_products(vec![
            product(1, "Claw hammer", "tools", 10.0),
            product(2, "Rake", "Garden", 10.0),
            product(3, "Table saw", "Tools", 100.0),
        ])
    }

    #[tokio::test]
    async fn repeated_read_all_hits_store_once() {
        let (service, store, _) = service_with(seeded(), CacheBehavior::Healthy);

        let first = service.get_all().await.unwrap();
        let second = service.get_all().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(ids(&first), vec![1, 2, 3]);
        assert_eq!(store.find_all_calls(), 1);
        assert_eq!(service.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn create_is_visible_in_item_and_collection_views() {
        let (service, _, cache) = service_with(seeded(), CacheBehavior::Healthy);
        service.get_all().await.unwrap();

        let created = service.create(dto("Chisel", 8.0)).await.unwrap();
        let id = created.id.unwrap();

        assert_eq!(service.get_by_id(id).await.unwrap(), Some(created.clone()));
        assert!(service.get_all().await.unwrap().contains(&created));
        assert!(cache.calls().contains(&format!("set item:{id}")));
        assert_eq!(cache.evictions(), vec!["evict collection".to_string()]);
    }

    #[tokio::test]
    async fn update_is_visible_in_item_and_collection_views() {
        let (service, _, _) = service_with(seeded(), CacheBehavior::Healthy);
        let id = ProductId::new(2);
        service.get_all().await.unwrap();
        service.get_by_id(id).await.unwrap();

        let updated = service.update(id, dto("Leaf rake", 12.0)).await.unwrap();

        assert_eq!(updated.name.as_deref(), Some("Leaf rake"));
        assert_eq!(updated.category, None);
        assert_eq!(service.get_by_id(id).await.unwrap(), Some(updated.clone()));
        assert!(service.get_all().await.unwrap().contains(&updated));
    }

    #[tokio::test]
    async fn partial_update_merges_and_stays_fresh() {
        let (service, _, _) = service_with(CountingStore::default(), CacheBehavior::Healthy);
        let created = service.create(dto("A", 10.0)).await.unwrap();
        let id = created.id.unwrap();
        service.get_all().await.unwrap();

        let patch = ProductDto {
            price: Some(20.0),
            ..ProductDto::default()
        };
        let merged = service.partial_update(id, patch).await.unwrap();

        assert_eq!(merged.name.as_deref(), Some("A"));
        assert_eq!(merged.price, Some(20.0));
        assert_eq!(service.get_by_id(id).await.unwrap(), Some(merged.clone()));
        assert_eq!(service.get_all().await.unwrap(), vec![merged]);
    }

    #[tokio::test]
    async fn delete_removes_item_and_collection_views() {
        let (service, _, _) = service_with(seeded(), CacheBehavior::Healthy);
        let id = ProductId::new(1);
        service.get_all().await.unwrap();
        service.get_by_id(id).await.unwrap();

        service.delete(id).await.unwrap();

        assert_eq!(service.get_by_id(id).await.unwrap(), None);
        assert_eq!(ids(&service.get_all().await.unwrap()), vec![2, 3]);
    }

    #[tokio::test]
    async fn search_matches_category_and_price_range() {
        let (service, _, cache) = service_with(seeded(), CacheBehavior::Healthy);
        let criteria = FilterCriteria {
            category: Some("Tools".to_string()),
            min_price: Some(5.0),
            max_price: Some(50.0),
            ..FilterCriteria::default()
        };

        let page = service.search(&criteria, &PageRequest::default()).await.unwrap();

        assert_eq!(ids(&page.content), vec![1]);
        assert_eq!(page.total_elements, 1);
        assert!(cache.calls().is_empty());
    }

    #[tokio::test]
    async fn inverted_range_is_rejected_without_io() {
        let (service, store, cache) = service_with(seeded(), CacheBehavior::Healthy);
        let criteria = FilterCriteria {
            min_price: Some(10.0),
            max_price: Some(5.0),
            ..FilterCriteria::default()
        };

        let err = service.search(&criteria, &PageRequest::default()).await.unwrap_err();

        assert!(matches!(err, CatalogError::Validation(_)));
        assert_eq!(store.total_calls(), 0);
        assert!(cache.calls().is_empty());
    }

    #[tokio::test]
    async fn delete_of_missing_id_touches_nothing() {
        let (service, store, cache) = service_with(seeded(), CacheBehavior::Healthy);
        let missing = ProductId::new(99);

        assert_eq!(service.delete(missing).await, Err(CatalogError::NotFound(missing)));
        assert_eq!(store.writes(), 0);
        assert!(cache.evictions().is_empty());
    }

    #[tokio::test]
    async fn updates_of_missing_id_touch_nothing() {
        let (service, store, cache) = service_with(seeded(), CacheBehavior::Healthy);
        let missing = ProductId::new(42);

        assert_eq!(
            service.update(missing, dto("X", 1.0)).await,
            Err(CatalogError::NotFound(missing))
        );
        assert_eq!(
            service.partial_update(missing, dto("X", 1.0)).await,
            Err(CatalogError::NotFound(missing))
        );
        assert_eq!(store.writes(), 0);
        assert!(cache.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_payloads_are_rejected_without_io() {
        let (service, store, cache) = service_with(seeded(), CacheBehavior::Healthy);

        let no_price = ProductDto {
            name: Some("Saw".to_string()),
            ..ProductDto::default()
        };
        assert!(matches!(service.create(no_price).await, Err(CatalogError::Validation(_))));

        let negative = ProductDto {
            price: Some(-3.0),
            ..ProductDto::default()
        };
        assert!(matches!(
            service.partial_update(ProductId::new(1), negative).await,
            Err(CatalogError::Validation(_))
        ));

        assert_eq!(store.total_calls(), 0);
        assert!(cache.calls().is_empty());
    }

    #[tokio::test]
    async fn create_ignores_client_supplied_id() {
        let (service, _, _) = service_with(seeded(), CacheBehavior::Healthy);
        let payload = ProductDto {
            id: Some(ProductId::new(1)),
            ..dto("Level", 15.0)
        };

        let created = service.create(payload).await.unwrap();

        assert_eq!(created.id, Some(ProductId::new(4)));
        assert_eq!(
            service.get_by_id(ProductId::new(1)).await.unwrap().unwrap().name.as_deref(),
            Some("Claw hammer")
        );
    }

    #[tokio::test]
    async fn single_field_lookups_bypass_cache() {
        let (service, _, cache) = service_with(seeded(), CacheBehavior::Healthy);

        assert_eq!(ids(&service.find_by_name("HAMMER").await.unwrap()), vec![1]);
        assert_eq!(ids(&service.find_by_category("tools").await.unwrap()), vec![1, 3]);
        assert_eq!(ids(&service.find_by_price_between(5.0, 50.0).await.unwrap()), vec![1, 2]);
        assert!(service.find_by_description("anything").await.unwrap().is_empty());
        assert!(matches!(
            service.find_by_price_between(9.0, 1.0).await,
            Err(CatalogError::Validation(_))
        ));
        assert!(cache.calls().is_empty());
    }

    #[tokio::test]
    async fn failing_cache_never_surfaces() {
        let (service, store, _) = service_with(seeded(), CacheBehavior::Failing);

        assert_eq!(ids(&service.get_all().await.unwrap()), vec![1, 2, 3]);
        assert_eq!(ids(&service.get_all().await.unwrap()), vec![1, 2, 3]);
        let created = service.create(dto("Chisel", 8.0)).await.unwrap();
        service.partial_update(created.id.unwrap(), dto("Wide chisel", 9.0)).await.unwrap();
        service.delete(ProductId::new(2)).await.unwrap();

        assert_eq!(ids(&service.get_all().await.unwrap()), vec![1, 3, 4]);
        assert_eq!(store.find_all_calls(), 3);
        assert!(service.cache_stats().failures > 0);
        assert_eq!(service.cache_stats().hits, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cache_degrades_to_miss() {
        let (service, store, _) = service_with(seeded(), CacheBehavior::Slow);

        assert_eq!(ids(&service.get_all().await.unwrap()), vec![1, 2, 3]);
        assert!(service.create(dto("Chisel", 8.0)).await.is_ok());
        assert_eq!(store.find_all_calls(), 1);
        assert!(service.cache_stats().failures >= 3);
    }

    #[tokio::test]
    async fn corrupted_payload_is_a_miss() {
        let (service, store, cache) = service_with(seeded(), CacheBehavior::Healthy);
        cache
            .inner
            .set("collection", b"{not json".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .inner
            .set("item:1", br#"{"cached_at":"2024-01-01T00:00:00Z","value":7}"#.to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(ids(&service.get_all().await.unwrap()), vec![1, 2, 3]);
        assert_eq!(
            service.get_by_id(ProductId::new(1)).await.unwrap().and_then(|p| p.name),
            Some("Claw hammer".to_string())
        );
        assert_eq!(store.find_all_calls(), 1);
        assert_eq!(service.cache_stats().failures, 2);

        service.get_all().await.unwrap();
        assert_eq!(store.find_all_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn store_timeout_is_a_dependency_error() {
        let store = CountingStore {
            find_all_delay: Some(Duration::from_secs(60)),
            ..seeded()
        };
        let (service, _, cache) = service_with(store, CacheBehavior::Healthy);

        let err = service.get_all().await.unwrap_err();

        assert_eq!(err, CatalogError::Dependency(StoreError::Timeout("find_all")));
        assert!(!cache.calls().contains(&"set collection".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn collection_entry_expires_after_ttl() {
        let (service, store, _) = service_with(seeded(), CacheBehavior::Healthy);

        service.get_all().await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        service.get_all().await.unwrap();
        assert_eq!(store.find_all_calls(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        service.get_all().await.unwrap();
        assert_eq!(store.find_all_calls(), 2);
    }

    fn slow_to_acknowledge() -> CountingStore {
        CountingStore {
            commit_delay: Some(Duration::from_secs(10)),
            ..seeded()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn update_timing_out_after_commit_does_not_serve_old_row() {
        let (service, store, _) = service_with(slow_to_acknowledge(), CacheBehavior::Healthy);
        let id = ProductId::new(2);
        service.get_all().await.unwrap();
        service.get_by_id(id).await.unwrap();

        let err = service.update(id, dto("Leaf rake", 12.0)).await.unwrap_err();

        assert_eq!(err, CatalogError::Dependency(StoreError::Timeout("update")));
        assert_eq!(
            store.inner.find_by_id(id).await.unwrap().map(|p| p.name),
            Some("Leaf rake".to_string())
        );
        let cached = service.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(cached.name.as_deref(), Some("Leaf rake"));
        assert!(service.get_all().await.unwrap().contains(&cached));
    }

    #[tokio::test(start_paused = true)]
    async fn partial_update_timing_out_after_commit_does_not_serve_old_row() {
        let (service, _, _) = service_with(slow_to_acknowledge(), CacheBehavior::Healthy);
        let id = ProductId::new(3);
        service.get_by_id(id).await.unwrap();

        let patch = ProductDto {
            price: Some(80.0),
            ..ProductDto::default()
        };
        let err = service.partial_update(id, patch).await.unwrap_err();

        assert_eq!(err, CatalogError::Dependency(StoreError::Timeout("update")));
        assert_eq!(service.get_by_id(id).await.unwrap().and_then(|p| p.price), Some(80.0));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_timing_out_after_commit_does_not_serve_deleted_row() {
        let (service, _, cache) = service_with(slow_to_acknowledge(), CacheBehavior::Healthy);
        let id = ProductId::new(1);
        service.get_all().await.unwrap();
        service.get_by_id(id).await.unwrap();

        let err = service.delete(id).await.unwrap_err();

        assert_eq!(err, CatalogError::Dependency(StoreError::Timeout("delete")));
        assert_eq!(
            cache.evictions(),
            vec!["evict item:1".to_string(), "evict collection".to_string()]
        );
        assert_eq!(service.get_by_id(id).await.unwrap(), None);
        assert_eq!(ids(&service.get_all().await.unwrap()), vec![2, 3]);
    }

    #[tokio::test]
    async fn read_miss_racing_an_update_does_not_repopulate_old_row() {
        let (service, store, _) = service_with(seeded(), CacheBehavior::Healthy);
        let service = Arc::new(service);
        let id = ProductId::new(2);
        let gate = store.gate_next_read();

        let reader = tokio::spawn({
            let service = service.clone();
            async move { service.get_by_id(id).await }
        });
        while store.reads() == 0 {
            tokio::task::yield_now().await;
        }

        let updated = service.update(id, dto("Leaf rake", 12.0)).await.unwrap();
        gate.notify_one();
        let raced = reader.await.unwrap().unwrap().unwrap();

        assert_eq!(raced.name.as_deref(), Some("Rake"));
        assert_eq!(service.get_by_id(id).await.unwrap(), Some(updated));
    }
}
