use axum::{extract::State, http::StatusCode, Json};

use crate::api::{AppJson, AppState, RequestContext};
use crate::error::AppError;
use crate::middleware::auth::{AdminSession, CustomerSession};
use crate::models::Order;
use crate::services::NewOrder;

pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(payload): AppJson<NewOrder>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let order = state.orders.create_order(payload).await.map_err(|e| ctx.tag(e))?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    _admin: AdminSession,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state.orders.list_orders().await.map_err(|e| ctx.tag(e))?;
    Ok(Json(orders))
}

/// Orders placed with the session's email, newest first
pub async fn mine(
    State(state): State<AppState>,
    ctx: RequestContext,
    CustomerSession(claims): CustomerSession,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state
        .orders
        .list_for_customer(&claims.email)
        .await
        .map_err(|e| ctx.tag(e))?;
    Ok(Json(orders))
}
