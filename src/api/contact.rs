use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::api::{AppJson, AppState, RequestContext};
use crate::error::AppError;
use crate::services::NewContactMessage;

pub async fn submit(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(payload): AppJson<NewContactMessage>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    state.contact.submit(payload).await.map_err(|e| ctx.tag(e))?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Message received" })),
    ))
}
