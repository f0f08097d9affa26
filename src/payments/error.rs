use thiserror::Error;

pub type PaymentResult<T> = Result<T, PaymentError>;

#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        field: Option<String>,
    },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Checksum verification failed: {message}")]
    ChecksumError { message: String },

    #[error("Provider {provider} is not configured")]
    NotConfigured { provider: String },

    #[error("Provider error: provider={provider}, message={message}")]
    ProviderError {
        provider: String,
        message: String,
        provider_code: Option<String>,
        retryable: bool,
    },
}

impl PaymentError {
    pub fn validation(message: impl Into<String>, field: &str) -> Self {
        PaymentError::ValidationError {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::ValidationError { .. } => false,
            PaymentError::NetworkError { .. } => true,
            PaymentError::ChecksumError { .. } => false,
            PaymentError::NotConfigured { .. } => false,
            PaymentError::ProviderError { retryable, .. } => *retryable,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            PaymentError::ValidationError { message, .. } => message.clone(),
            PaymentError::NetworkError { .. } => {
                "Payment provider is temporarily unavailable".to_string()
            }
            PaymentError::ChecksumError { .. } => "Checksum verification failed".to_string(),
            PaymentError::NotConfigured { .. } => "Payment method is not available".to_string(),
            PaymentError::ProviderError { .. } => "Payment provider returned an error".to_string(),
        }
    }
}

impl From<PaymentError> for crate::error::AppError {
    fn from(err: PaymentError) -> Self {
        use crate::error::{AppError, AppErrorKind, ExternalError, InfrastructureError};

        match err {
            PaymentError::ValidationError { message, field } => {
                AppError::invalid_field(field.unwrap_or_else(|| "payment".to_string()), message)
            }
            PaymentError::ChecksumError { .. } => {
                AppError::invalid_field("CHECKSUMHASH", err.user_message())
            }
            PaymentError::NotConfigured { provider } => {
                AppError::new(AppErrorKind::Infrastructure(InfrastructureError::Configuration {
                    message: format!("payment provider {} is not configured", provider),
                }))
            }
            PaymentError::NetworkError { .. } => {
                AppError::new(AppErrorKind::External(ExternalError::PaymentGateway {
                    provider: "paytm".to_string(),
                    message: err.to_string(),
                    is_retryable: err.is_retryable(),
                }))
            }
            PaymentError::ProviderError {
                ref provider,
                retryable,
                ..
            } => AppError::new(AppErrorKind::External(ExternalError::PaymentGateway {
                provider: provider.clone(),
                message: err.to_string(),
                is_retryable: retryable,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn checksum_failure_is_a_client_error() {
        let app: AppError = PaymentError::ChecksumError {
            message: "mismatch".to_string(),
        }
        .into();
        assert_eq!(app.status_code(), 400);
        assert!(!app.is_retryable());
    }

    #[test]
    fn network_failure_becomes_bad_gateway() {
        let app: AppError = PaymentError::NetworkError {
            message: "connection refused".to_string(),
        }
        .into();
        assert_eq!(app.status_code(), 502);
        assert!(!app.user_message().contains("refused"));
    }

    #[test]
    fn validation_keeps_field() {
        let app: AppError = PaymentError::validation("amount must be positive", "amount").into();
        assert_eq!(app.status_code(), 400);
        assert!(app.user_message().contains("amount"));
    }
}
