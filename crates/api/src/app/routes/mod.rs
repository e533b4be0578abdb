use axum::{routing::get, Router};

pub mod products;
pub mod system;

/// Router for all catalog endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/cache/stats", get(system::cache_stats))
        .nest("/api/products", products::router())
}
