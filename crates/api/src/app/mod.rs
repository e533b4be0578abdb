//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: backend selection (store, cache) and the catalog service
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: query-string DTOs and their mapping to criteria/pagination
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: services::AppServices) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_id))
                .layer(Extension(Arc::new(services))),
        )
}
