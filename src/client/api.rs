//! Storefront view of the backend: the three calls checkout needs
//!
//! [`HttpStorefrontApi`] talks to a running server; [`InProcessStorefrontApi`] calls the
//! same services directly and backs the client tests.

use crate::api::AppState;
use crate::error::{AppError, ErrorCode};
use crate::middleware::error::ErrorResponse;
use crate::models::Order;
use crate::payments::types::{
    CustomerContact, PaymentInitiation, PaymentRequest, RedirectBody, RedirectInitiation,
    UpiTarget,
};
use crate::payments::{PaymentProvider, ProviderName};
use crate::services::NewOrder;
use async_trait::async_trait;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The backend answered with an error body
    #[error("request rejected with status {status}: {message}")]
    Rejected {
        status: u16,
        code: Option<ErrorCode>,
        message: String,
    },

    #[error("could not reach the storefront backend: {0}")]
    Transport(String),

    #[error("unexpected response from the storefront backend: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message suitable for showing to the customer
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Transport(_) => {
                "We couldn't reach the restaurant. Please check your connection and try again."
                    .to_string()
            }
            ApiError::Decode(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::Rejected {
            status: err.status_code(),
            code: Some(err.error_code()),
            message: err.user_message(),
        }
    }
}

/// Parameters of a checksum-gateway initiation
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    pub order_id: String,
    pub amount: Decimal,
    pub customer_email: String,
    pub customer_phone: String,
}

#[async_trait]
pub trait StorefrontApi: Send + Sync {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError>;

    async fn initiate_paytm(&self, request: &GatewayRequest) -> Result<RedirectInitiation, ApiError>;

    async fn upi_target(&self, amount: Decimal) -> Result<UpiTarget, ApiError>;
}

pub struct HttpStorefrontApi {
    client: Client,
    base_url: String,
}

impl HttpStorefrontApi {
    /// `base_url` is the server root, e.g. `http://localhost:5000`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to initialize HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()));
        }

        let (code, message) = match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(body) => (Some(body.error), body.message),
            Err(_) => (None, format!("HTTP {}", status.as_u16())),
        };
        warn!(status = status.as_u16(), message = %message, "storefront request rejected");
        Err(ApiError::Rejected {
            status: status.as_u16(),
            code,
            message,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitiateResponse {
    paytm_params: PaytmParams,
    paytm_url: String,
    order_id: String,
}

#[derive(Debug, Deserialize)]
struct PaytmParams {
    body: RedirectBody,
    head: PaytmHead,
}

#[derive(Debug, Deserialize)]
struct PaytmHead {
    signature: String,
}

#[async_trait]
impl StorefrontApi for HttpStorefrontApi {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        let response = self
            .client
            .post(self.url("/orders"))
            .json(order)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn initiate_paytm(&self, request: &GatewayRequest) -> Result<RedirectInitiation, ApiError> {
        let body = serde_json::json!({
            "orderId": request.order_id,
            "amount": request.amount,
            "customerEmail": request.customer_email,
            "customerPhone": request.customer_phone,
        });
        let response = self
            .client
            .post(self.url("/paytm/initiate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let initiated: InitiateResponse = Self::decode(response).await?;
        Ok(RedirectInitiation {
            order_id: initiated.order_id,
            body: initiated.paytm_params.body,
            signature: initiated.paytm_params.head.signature,
            redirect_url: initiated.paytm_url,
        })
    }

    async fn upi_target(&self, amount: Decimal) -> Result<UpiTarget, ApiError> {
        let url = Url::parse_with_params(&self.url("/payment/upi"), &[("amount", amount.to_string())])
            .map_err(|e| ApiError::Transport(format!("invalid backend URL: {}", e)))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::decode(response).await
    }
}

/// Calls the backend services without going over the network
pub struct InProcessStorefrontApi {
    state: AppState,
}

impl InProcessStorefrontApi {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl StorefrontApi for InProcessStorefrontApi {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        Ok(self.state.orders.create_order(order.clone()).await?)
    }

    async fn initiate_paytm(&self, request: &GatewayRequest) -> Result<RedirectInitiation, ApiError> {
        let initiation = self
            .state
            .payments
            .paytm()
            .initiate(PaymentRequest {
                order_id: Some(request.order_id.clone()),
                amount: request.amount,
                customer: CustomerContact {
                    email: Some(request.customer_email.clone()),
                    phone: Some(request.customer_phone.clone()),
                },
            })
            .await
            .map_err(AppError::from)?;
        match initiation {
            PaymentInitiation::Redirect(redirect) => Ok(redirect),
            other => {
                debug!(?other, "unexpected initiation kind");
                Err(ApiError::Decode(format!(
                    "{} returned a non-redirect initiation",
                    ProviderName::Paytm
                )))
            }
        }
    }

    async fn upi_target(&self, amount: Decimal) -> Result<UpiTarget, ApiError> {
        Ok(self
            .state
            .payments
            .manual_upi()
            .target(amount)
            .map_err(AppError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_errors_surface_server_message() {
        let err = ApiError::from(AppError::missing_field("customerPhone"));
        match &err {
            ApiError::Rejected { status, code, .. } => {
                assert_eq!(*status, 400);
                assert!(code.is_some());
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.user_message(), AppError::missing_field("customerPhone").user_message());
    }

    #[test]
    fn transport_errors_get_a_generic_message() {
        let err = ApiError::Transport("connection refused".to_string());
        assert!(!err.user_message().contains("refused"));
    }

    #[test]
    fn base_url_is_normalised() {
        let api = HttpStorefrontApi::new("http://localhost:5000/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.url("/orders"), "http://localhost:5000/api/orders");
    }
}
