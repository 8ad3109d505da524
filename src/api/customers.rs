//! Customer ledger endpoints (owner only).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{CreateCustomerRequest, Customer, UpdateCustomerRequest};
use crate::services::CustomerLedger;
use crate::AppState;

use super::error::{ApiError, ApiJson};
use super::MessageResponse;

pub async fn list_customers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    Ok(Json(CustomerLedger::new(&state.db).list().await?))
}

pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let customer = CustomerLedger::new(&state.db).create(req).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateCustomerRequest>,
) -> Result<Json<Customer>, ApiError> {
    Ok(Json(CustomerLedger::new(&state.db).update(&id, req).await?))
}

/// Sales of the removed customer are kept
pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    CustomerLedger::new(&state.db).remove(&id).await?;
    Ok(Json(MessageResponse::new("Customer removed")))
}
