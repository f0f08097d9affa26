//! Customer session endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::api::{AppJson, AppState, RequestContext};
use crate::error::AppError;
use crate::middleware::auth::CustomerSession;
use crate::services::{LoginRequest, SessionResponse, SignupRequest};

pub async fn signup(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(request): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = state.customers.signup(request).await.map_err(|e| ctx.tag(e))?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.customers.login(request).await.map_err(|e| ctx.tag(e))?;
    Ok(Json(session))
}

pub async fn profile(
    State(state): State<AppState>,
    ctx: RequestContext,
    CustomerSession(claims): CustomerSession,
) -> Result<Json<Value>, AppError> {
    let user = state.customers.profile(&claims).await.map_err(|e| ctx.tag(e))?;
    Ok(Json(json!({ "user": user })))
}
