//! Product catalog endpoints (owner only).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{CreateProductRequest, Product, UpdateProductRequest};
use crate::services::Catalog;
use crate::AppState;

use super::error::{ApiError, ApiJson};
use super::MessageResponse;

pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(Catalog::new(&state.db).list().await?))
}

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = Catalog::new(&state.db).create(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(Catalog::new(&state.db).update(&id, req).await?))
}

pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    Catalog::new(&state.db).remove(&id).await?;
    Ok(Json(MessageResponse::new("Product removed")))
}
