use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use catalog_core::PageRequest;
use catalog_infra::cache::InMemoryCacheStore;
use catalog_infra::product_store::{InMemoryProductStore, ProductStore};
use catalog_infra::{CachePolicy, CatalogService};
use catalog_products::{FilterCriteria, Product, ProductId, build_predicate};
use std::sync::Arc;

const CATEGORIES: [&str; 4] = ["Tools", "Garden", "Kitchen", "Outdoor"];

fn catalog(size: usize) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            id: ProductId::new(i as i64 + 1),
            name: format!("Product {i} hammer-{}", i % 7),
            description: Some(format!("Description for item number {i}")),
            category: Some(CATEGORIES[i % CATEGORIES.len()].to_string()),
            price: (i % 500) as f64 + 0.99,
            quantity: (i % 50) as i64,
            image_url: None,
        })
        .collect()
}

fn full_criteria() -> FilterCriteria {
    FilterCriteria {
        name: Some("hammer-3".to_string()),
        description: Some("item".to_string()),
        category: Some("tools".to_string()),
        min_price: Some(10.0),
        max_price: Some(250.0),
        min_quantity: Some(1),
        max_quantity: Some(40),
    }
}

fn bench_predicate_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("predicate_build");

    group.bench_function("empty_criteria", |b| {
        let criteria = FilterCriteria::default();
        b.iter(|| black_box(build_predicate(black_box(&criteria))));
    });

    group.bench_function("all_fields", |b| {
        let criteria = full_criteria();
        b.iter(|| black_box(build_predicate(black_box(&criteria))));
    });

    group.finish();
}

fn bench_predicate_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("predicate_evaluation");
    let predicate = build_predicate(&full_criteria());

    for size in [100, 1_000, 10_000].iter() {
        let rows = catalog(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("filter_rows", size), &rows, |b, rows| {
            b.iter(|| black_box(rows.iter().filter(|p| predicate.matches(p)).count()));
        });
    }

    group.finish();
}

fn bench_in_memory_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("in_memory_search");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();

    let store = InMemoryProductStore::with_products(catalog(10_000));
    let predicate = build_predicate(&full_criteria());
    let request = PageRequest::default();

    group.bench_function("find_page_10k", |b| {
        b.iter(|| black_box(runtime.block_on(store.find_page(&predicate, &request)).unwrap()));
    });

    group.finish();
}

fn bench_cached_vs_uncached_read_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_all");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();

    let store = Arc::new(InMemoryProductStore::with_products(catalog(1_000)));

    group.bench_function("store_direct", |b| {
        b.iter(|| black_box(runtime.block_on(store.find_all()).unwrap()));
    });

    group.bench_function("through_cache", |b| {
        let service = CatalogService::new(store.clone(), InMemoryCacheStore::new(), CachePolicy::default());
        runtime.block_on(service.get_all()).unwrap();
        b.iter(|| black_box(runtime.block_on(service.get_all()).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_predicate_build,
    bench_predicate_evaluation,
    bench_in_memory_search,
    bench_cached_vs_uncached_read_all
);
criterion_main!(benches);
