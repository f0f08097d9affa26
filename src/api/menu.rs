use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::{AppState, RequestContext};
use crate::error::AppError;
use crate::models::MenuItem;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    let items = state.menu.list().await.map_err(|e| ctx.tag(e))?;
    Ok(Json(items))
}

pub async fn search(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    let items = state.menu.search(&query.q).await.map_err(|e| ctx.tag(e))?;
    Ok(Json(items))
}

pub async fn by_category(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(category): Path<String>,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    let items = state
        .menu
        .by_category(&category)
        .await
        .map_err(|e| ctx.tag(e))?;
    Ok(Json(items))
}
