use axum::{extract::State, http::StatusCode, Json};

use crate::api::AppState;
use crate::health::{HealthChecker, HealthStatus};

/// 200 while storage answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let checker = HealthChecker::new(state.repos.store.clone(), state.payments.paytm().is_configured());
    let status = checker.check_health().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}
