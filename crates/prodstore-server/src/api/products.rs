//! Product CRUD and patch handlers.
//!
//! - `GET    /products`: list all products
//! - `POST   /products`: create from a full body
//! - `GET    /products/{id}`: single product
//! - `PUT    /products/{id}`: full replace, missing keys cleared
//! - `PATCH  /products/{id}`: partial update of supplied fields
//! - `DELETE /products/{id}`: delete
//! - `PATCH  /products/{id}/store`: merge prices into the stores map

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use prodstore_core::{Product, ProductBody, ProductPatch, Stores};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{decode_error, map_store_error, ApiError, ApiResponse, AppState, ResponseMeta};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize)]
pub(super) struct DeletedResponse {
    pub deleted: bool,
}

fn product_id(request_id: &str, path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| decode_error(request_id, &rejection.body_text()))
}

fn decode_body<T>(request_id: &str, body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| decode_error(request_id, &rejection.body_text()))
}

fn respond<T: Serialize>(req_id: RequestId, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> ApiResult<Vec<Product>> {
    let products = state
        .store
        .list_products()
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(respond(req_id, products))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Product> {
    let id = product_id(&req_id.0, path)?;

    let product = state
        .store
        .get_product(id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(respond(req_id, product))
}

/// POST /products: returns the stored product with its generated id.
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<ProductBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let body = decode_body(&req_id.0, body)?;

    let id = state
        .store
        .create_product(body.clone())
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok((StatusCode::CREATED, respond(req_id, body.into_product(id))))
}

/// PUT /products/{id}: every mutable field is overwritten.
pub(super) async fn replace_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<ProductBody>, JsonRejection>,
) -> ApiResult<Product> {
    let id = product_id(&req_id.0, path)?;
    let body = decode_body(&req_id.0, body)?;

    let product = state
        .store
        .replace_product(id, body)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(respond(req_id, product))
}

pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<DeletedResponse> {
    let id = product_id(&req_id.0, path)?;

    state
        .store
        .delete_product(id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(respond(req_id, DeletedResponse { deleted: true }))
}

/// PATCH /products/{id}: only keys present in the body are written.
pub(super) async fn patch_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<ProductPatch>, JsonRejection>,
) -> ApiResult<Product> {
    let id = product_id(&req_id.0, path)?;
    let product_patch = decode_body(&req_id.0, body)?;

    let product = state
        .store
        .patch_product(id, product_patch)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(respond(req_id, product))
}

/// PATCH /products/{id}/store: body is a bare `{ "store": price }` map.
pub(super) async fn patch_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<Stores>, JsonRejection>,
) -> ApiResult<Product> {
    let id = product_id(&req_id.0, path)?;
    let stores = decode_body(&req_id.0, body)?;

    let product = state
        .store
        .patch_stores(id, stores)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(respond(req_id, product))
}
