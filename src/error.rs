//! Unified error handling for the storefront backend
//!
//! Every failure that can reach an HTTP client is expressed as an [`AppError`]. The kind
//! decides the status code, the machine-readable [`ErrorCode`] and the message shown to
//! the user; internal details stay in the logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for programmatic handling on the client side
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Domain errors (4xx)
    OrderNotFound,
    ReservationNotFound,
    MenuItemNotFound,
    CustomerNotFound,
    DuplicateMenuItem,
    EmailAlreadyRegistered,

    // Authentication errors (401, 403)
    Unauthorized,
    TokenExpired,
    InvalidCredentials,
    Forbidden,

    // Infrastructure errors (5xx)
    StorageError,
    ConfigurationError,

    // External errors (502, 504)
    PaymentGatewayError,
    ExternalServiceTimeout,

    // Generic
    InternalError,
    ValidationError,
}

/// Business rule violations and lookups that found nothing
#[derive(Debug, Clone)]
pub enum DomainError {
    OrderNotFound { order_id: String },
    ReservationNotFound { reservation_id: String },
    MenuItemNotFound { item_id: String },
    CustomerNotFound { customer_id: String },
    /// Admin tried to add an item whose id is already on the menu
    DuplicateMenuItem { item_id: String },
    EmailAlreadyRegistered { email: String },
}

/// Infrastructure-level errors (storage, configuration)
#[derive(Debug, Clone)]
pub enum InfrastructureError {
    /// Collection could not be read from or written to the document store
    Storage { message: String },
    /// Missing or invalid configuration
    Configuration { message: String },
}

/// External service errors (payment gateways)
#[derive(Debug, Clone)]
pub enum ExternalError {
    PaymentGateway {
        provider: String,
        message: String,
        is_retryable: bool,
    },
    Timeout { service: String, timeout_secs: u64 },
}

/// Input validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Required field missing or blank
    MissingField { field: String },
    /// Field present but unusable
    InvalidField { field: String, reason: String },
}

/// Authentication and authorisation failures
#[derive(Debug, Clone)]
pub enum AuthError {
    MissingToken,
    InvalidToken { reason: String },
    TokenExpired,
    InvalidCredentials,
    /// Valid token, wrong audience (customer token on an admin route and vice versa)
    Forbidden { required_role: String },
}

/// Unified application error type
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    Domain(DomainError),
    Infrastructure(InfrastructureError),
    External(ExternalError),
    Validation(ValidationError),
    Auth(AuthError),
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
            context: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Validation(ValidationError::MissingField {
            field: field.into(),
        }))
    }

    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Validation(ValidationError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }))
    }

    pub fn unauthorized() -> Self {
        Self::new(AppErrorKind::Auth(AuthError::MissingToken))
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::Infrastructure(InfrastructureError::Storage {
            message: message.into(),
        }))
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::OrderNotFound { .. } => 404,
                DomainError::ReservationNotFound { .. } => 404,
                DomainError::MenuItemNotFound { .. } => 404,
                DomainError::CustomerNotFound { .. } => 404,
                DomainError::DuplicateMenuItem { .. } => 409, // Conflict
                DomainError::EmailAlreadyRegistered { .. } => 409,
            },
            AppErrorKind::Infrastructure(_) => 500,
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { .. } => 502, // Bad Gateway
                ExternalError::Timeout { .. } => 504,        // Gateway Timeout
            },
            AppErrorKind::Validation(_) => 400,
            AppErrorKind::Auth(err) => match err {
                AuthError::Forbidden { .. } => 403,
                _ => 401,
            },
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::OrderNotFound { .. } => ErrorCode::OrderNotFound,
                DomainError::ReservationNotFound { .. } => ErrorCode::ReservationNotFound,
                DomainError::MenuItemNotFound { .. } => ErrorCode::MenuItemNotFound,
                DomainError::CustomerNotFound { .. } => ErrorCode::CustomerNotFound,
                DomainError::DuplicateMenuItem { .. } => ErrorCode::DuplicateMenuItem,
                DomainError::EmailAlreadyRegistered { .. } => ErrorCode::EmailAlreadyRegistered,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Storage { .. } => ErrorCode::StorageError,
                InfrastructureError::Configuration { .. } => ErrorCode::ConfigurationError,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { .. } => ErrorCode::PaymentGatewayError,
                ExternalError::Timeout { .. } => ErrorCode::ExternalServiceTimeout,
            },
            AppErrorKind::Validation(_) => ErrorCode::ValidationError,
            AppErrorKind::Auth(err) => match err {
                AuthError::TokenExpired => ErrorCode::TokenExpired,
                AuthError::InvalidCredentials => ErrorCode::InvalidCredentials,
                AuthError::Forbidden { .. } => ErrorCode::Forbidden,
                AuthError::MissingToken | AuthError::InvalidToken { .. } => {
                    ErrorCode::Unauthorized
                }
            },
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::OrderNotFound { order_id } => {
                    format!("Order '{}' not found", order_id)
                }
                DomainError::ReservationNotFound { reservation_id } => {
                    format!("Reservation '{}' not found", reservation_id)
                }
                DomainError::MenuItemNotFound { item_id } => {
                    format!("Menu item '{}' not found", item_id)
                }
                DomainError::CustomerNotFound { .. } => "User not found".to_string(),
                DomainError::DuplicateMenuItem { item_id } => {
                    format!("Menu item '{}' already exists", item_id)
                }
                DomainError::EmailAlreadyRegistered { .. } => {
                    "Email already registered".to_string()
                }
            },
            AppErrorKind::Infrastructure(_) => {
                "Service temporarily unavailable. Please try again later".to_string()
            }
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway {
                    provider,
                    is_retryable,
                    ..
                } => {
                    if *is_retryable {
                        format!(
                            "Payment gateway ({}) is temporarily unavailable. Please try again",
                            provider
                        )
                    } else {
                        "Payment processing failed. Please contact support".to_string()
                    }
                }
                ExternalError::Timeout {
                    service,
                    timeout_secs,
                } => format!(
                    "{} request timed out after {} seconds. Please try again",
                    service, timeout_secs
                ),
            },
            AppErrorKind::Validation(err) => match err {
                ValidationError::MissingField { field } => {
                    format!("Required field '{}' is missing", field)
                }
                ValidationError::InvalidField { field, reason } => {
                    format!("Invalid value for '{}': {}", field, reason)
                }
            },
            AppErrorKind::Auth(err) => match err {
                AuthError::MissingToken => "No token provided".to_string(),
                AuthError::InvalidToken { .. } => "Invalid token".to_string(),
                AuthError::TokenExpired => "Session expired. Please log in again".to_string(),
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::Forbidden { required_role } => {
                    format!("This action requires the '{}' role", required_role)
                }
            },
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Storage { .. } => true,
                InfrastructureError::Configuration { .. } => false,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { is_retryable, .. } => *is_retryable,
                ExternalError::Timeout { .. } => true,
            },
            AppErrorKind::Domain(_) | AppErrorKind::Validation(_) | AppErrorKind::Auth(_) => {
                false
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())?;
        if let Some(context) = &self.context {
            write!(f, " ({})", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

// From<DatabaseError>, From<PaymentError> and From<JwtError> live next to their error types.

/// Result type for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_not_found_error() {
        let error = AppError::new(AppErrorKind::Domain(DomainError::OrderNotFound {
            order_id: "1700000000000".to_string(),
        }));

        assert_eq!(error.status_code(), 404);
        assert_eq!(error.error_code(), ErrorCode::OrderNotFound);
        assert!(error.user_message().contains("1700000000000"));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_gateway_error_is_bad_gateway() {
        let error = AppError::new(AppErrorKind::External(ExternalError::PaymentGateway {
            provider: "paytm".to_string(),
            message: "connection reset".to_string(),
            is_retryable: false,
        }));

        assert_eq!(error.status_code(), 502);
        assert_eq!(error.error_code(), ErrorCode::PaymentGatewayError);
        assert!(!error.user_message().contains("connection reset"));
    }

    #[test]
    fn test_validation_error() {
        let error = AppError::missing_field("customerPhone");

        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), ErrorCode::ValidationError);
        assert!(error.user_message().contains("customerPhone"));
    }

    #[test]
    fn test_auth_errors() {
        assert_eq!(AppError::unauthorized().status_code(), 401);

        let forbidden = AppError::new(AppErrorKind::Auth(AuthError::Forbidden {
            required_role: "admin".to_string(),
        }));
        assert_eq!(forbidden.status_code(), 403);
        assert_eq!(forbidden.error_code(), ErrorCode::Forbidden);

        let expired = AppError::new(AppErrorKind::Auth(AuthError::TokenExpired));
        assert_eq!(expired.error_code(), ErrorCode::TokenExpired);
    }

    #[test]
    fn test_storage_error_hides_details() {
        let error = AppError::storage("permission denied: /var/data/orders.json");
        assert_eq!(error.status_code(), 500);
        assert!(!error.user_message().contains("/var/data"));
        assert!(error.is_retryable());
    }

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::EmailAlreadyRegistered).unwrap();
        assert_eq!(json, "\"EMAIL_ALREADY_REGISTERED\"");
    }
}
