use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, Json};

use catalog_infra::CacheStats;

use crate::app::services::AppServices;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Cache hit/miss/write/eviction/failure counters since startup.
pub async fn cache_stats(Extension(services): Extension<Arc<AppServices>>) -> Json<CacheStats> {
    Json(services.catalog.cache_stats())
}
