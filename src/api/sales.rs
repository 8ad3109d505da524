use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::db::{CreateSaleRequest, Sale};
use crate::services::{SaleRecorder, Session};
use crate::AppState;

use super::error::{ApiError, ApiJson};

/// GET /api/sales (owner)
pub async fn list_sales(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Sale>>, ApiError> {
    Ok(Json(SaleRecorder::new(&state.db).list_sales().await?))
}

/// POST /api/sales (owner)
pub async fn create_sale(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateSaleRequest>,
) -> Result<(StatusCode, Json<Sale>), ApiError> {
    let sale = SaleRecorder::new(&state.db).create_sale(req).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// GET /api/sales/myorders (any authenticated user)
pub async fn my_orders(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<Vec<Sale>>, ApiError> {
    Ok(Json(SaleRecorder::new(&state.db).my_orders(&session.user).await?))
}
