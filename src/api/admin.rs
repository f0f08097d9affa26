//! Admin back-office endpoints. Everything except `login` sits behind `require_admin`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::api::{AppJson, AppState, RequestContext};
use crate::error::AppError;
use crate::middleware::auth::AdminSession;
use crate::models::{MenuItem, Order, OrderStatus};
use crate::services::{AdminLoginRequest, AdminLoginResponse, DashboardStats, MenuItemPatch, NewMenuItem};

#[derive(Debug, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(request): AppJson<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, AppError> {
    let response = state.admin.login(request).map_err(|e| ctx.tag(e))?;
    Ok(Json(response))
}

pub async fn verify(
    State(state): State<AppState>,
    Extension(AdminSession(claims)): Extension<AdminSession>,
) -> Json<Value> {
    Json(state.admin.verify(&claims))
}

pub async fn stats(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<DashboardStats>, AppError> {
    let stats = state.admin.stats().await.map_err(|e| ctx.tag(e))?;
    Ok(Json(stats))
}

pub async fn add_menu_item(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(payload): AppJson<NewMenuItem>,
) -> Result<(StatusCode, Json<MenuItem>), AppError> {
    let item = state.menu.add_item(payload).await.map_err(|e| ctx.tag(e))?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_menu_item(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    AppJson(patch): AppJson<MenuItemPatch>,
) -> Result<Json<MenuItem>, AppError> {
    let item = state.menu.update_item(&id, patch).await.map_err(|e| ctx.tag(e))?;
    Ok(Json(item))
}

pub async fn toggle_menu_item(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<MenuItem>, AppError> {
    let item = state
        .menu
        .toggle_availability(&id)
        .await
        .map_err(|e| ctx.tag(e))?;
    Ok(Json(item))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    AppJson(update): AppJson<OrderStatusUpdate>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .update_status(&id, update.status)
        .await
        .map_err(|e| ctx.tag(e))?;
    Ok(Json(order))
}
