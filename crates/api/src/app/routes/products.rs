use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;

use catalog_products::{ProductDto, ProductId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/search/name", get(search_by_name))
        .route("/search/description", get(search_by_description))
        .route("/search/category", get(search_by_category))
        .route("/search/price", get(search_by_price))
        .route(
            "/:id",
            get(get_product)
                .put(update_product)
                .patch(patch_product)
                .delete(delete_product),
        )
}

fn parse_id(id: &str) -> Result<ProductId, axum::response::Response> {
    id.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"))
}

fn query<T: DeserializeOwned>(query: Result<Query<T>, QueryRejection>) -> Result<T, axum::response::Response> {
    query
        .map(|Query(q)| q)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.body_text()))
}

fn body(payload: Result<Json<ProductDto>, JsonRejection>) -> Result<ProductDto, axum::response::Response> {
    payload
        .map(|Json(dto)| dto)
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.body_text()))
}

pub async fn list_products(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.catalog.get_all().await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.get_by_id(id).await {
        Ok(Some(product)) => Json(product).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("product {id} not found")),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<ProductDto>, JsonRejection>,
) -> axum::response::Response {
    let dto = match body(payload) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.create(dto).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<ProductDto>, JsonRejection>,
) -> axum::response::Response {
    let (id, dto) = match (parse_id(&id), body(payload)) {
        (Ok(id), Ok(dto)) => (id, dto),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    match services.catalog.update(id, dto).await {
        Ok(updated) => Json(updated).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn patch_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<ProductDto>, JsonRejection>,
) -> axum::response::Response {
    let (id, dto) = match (parse_id(&id), body(payload)) {
        (Ok(id), Ok(dto)) => (id, dto),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    match services.catalog.partial_update(id, dto).await {
        Ok(updated) => Json(updated).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn search_products(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::SearchParams>, QueryRejection>,
) -> axum::response::Response {
    let params = match query(params) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let page = match params.page_request(services.max_page_size) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.search(&params.criteria(), &page).await {
        Ok(found) => Json(found).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn search_by_name(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::NameQuery>, QueryRejection>,
) -> axum::response::Response {
    let params = match query(params) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.find_by_name(&params.name).await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn search_by_description(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::DescriptionQuery>, QueryRejection>,
) -> axum::response::Response {
    let params = match query(params) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.find_by_description(&params.description).await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn search_by_category(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::CategoryQuery>, QueryRejection>,
) -> axum::response::Response {
    let params = match query(params) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.find_by_category(&params.category).await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn search_by_price(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<dto::PriceRangeQuery>, QueryRejection>,
) -> axum::response::Response {
    let params = match query(params) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.find_by_price_between(params.min, params.max).await {
        Ok(products) => Json(products).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}
