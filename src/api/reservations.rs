use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::api::{AppJson, AppState, RequestContext};
use crate::error::AppError;
use crate::middleware::auth::AdminSession;
use crate::models::{Reservation, ReservationStatus};
use crate::services::NewReservation;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ReservationStatus,
}

pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(payload): AppJson<NewReservation>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    let reservation = state
        .reservations
        .create(payload)
        .await
        .map_err(|e| ctx.tag(e))?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

pub async fn list(
    State(state): State<AppState>,
    ctx: RequestContext,
    _admin: AdminSession,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let reservations = state.reservations.list().await.map_err(|e| ctx.tag(e))?;
    Ok(Json(reservations))
}

pub async fn update_status(
    State(state): State<AppState>,
    ctx: RequestContext,
    _admin: AdminSession,
    Path(id): Path<String>,
    AppJson(update): AppJson<StatusUpdate>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state
        .reservations
        .update_status(&id, update.status)
        .await
        .map_err(|e| ctx.tag(e))?;
    Ok(Json(reservation))
}
