//! JSON error bodies for the storefront API
//!
//! Every failed request answers with an [`ErrorResponse`]; the storefront client parses the
//! same shape back in `client::api`.

use crate::error::{AppError, AppErrorKind, ErrorCode, ValidationError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Body of every non-2xx API response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: ErrorCode,
    /// Customer-facing text; never carries store paths or gateway internals
    pub message: String,
    /// Echo of `x-request-id` when the request carried one
    pub request_id: Option<String>,
    pub timestamp: String,
    /// `{"field": ...}` for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Set for upstream gateway and store failures the customer may retry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError) -> Self {
        let details = match &error.kind {
            AppErrorKind::Validation(
                ValidationError::MissingField { field }
                | ValidationError::InvalidField { field, .. },
            ) => Some(serde_json::json!({ "field": field })),
            _ => None,
        };
        Self {
            error: error.error_code(),
            message: error.user_message(),
            request_id: error.request_id.clone(),
            timestamp: Utc::now().to_rfc3339(),
            details,
            retryable: Some(error.is_retryable()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Full error detail stays in the log; the body only gets the user message.
        if status.is_server_error() {
            tracing::error!(error = ?self, request_id = ?self.request_id, status = status.as_u16(), "request failed");
        } else {
            tracing::warn!(error = %self, request_id = ?self.request_id, status = status.as_u16(), "request rejected");
        }

        (status, Json(ErrorResponse::from_app_error(&self))).into_response()
    }
}

pub fn get_request_id_from_headers(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;

    #[test]
    fn test_error_response_from_app_error() {
        let app_error = AppError::new(AppErrorKind::Domain(DomainError::ReservationNotFound {
            reservation_id: "42".to_string(),
        }))
        .with_request_id("req_123");

        let error_response = ErrorResponse::from_app_error(&app_error);

        assert_eq!(error_response.error, ErrorCode::ReservationNotFound);
        assert_eq!(error_response.request_id, Some("req_123".to_string()));
        assert!(error_response.message.contains("42"));
    }

    #[test]
    fn test_validation_errors_name_the_field() {
        let error = AppError::missing_field("deliveryAddress");
        let body = ErrorResponse::from_app_error(&error);
        assert_eq!(body.details, Some(serde_json::json!({ "field": "deliveryAddress" })));
        assert_eq!(body.retryable, Some(false));

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_body_uses_camel_case() {
        let body = ErrorResponse::from_app_error(&AppError::missing_field("phone").with_request_id("r1"));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["requestId"], "r1");
        assert!(value.get("request_id").is_none());
    }

    #[test]
    fn test_request_id_header_lookup() {
        let mut headers = axum::http::HeaderMap::new();
        assert_eq!(get_request_id_from_headers(&headers), None);
        headers.insert("x-request-id", "abc".parse().unwrap());
        assert_eq!(get_request_id_from_headers(&headers), Some("abc".to_string()));
    }
}
