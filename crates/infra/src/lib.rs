//! Infrastructure layer: stores, caches, configuration and the catalog service.

pub mod cache;
pub mod cache_coordinator;
pub mod catalog_service;
pub mod config;
pub mod product_store;

mod deadline;
mod integration_tests;

pub use cache_coordinator::{CacheCoordinator, CachePolicy, CacheStats};
pub use catalog_service::{CatalogError, CatalogService};
pub use config::{CatalogConfig, ConfigError};
