//! Shared gateway plumbing: one-shot JSON calls and constant-time comparison

use crate::payments::error::{PaymentError, PaymentResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::warn;

/// JSON client for gateway APIs. Calls are made once; a failed status query is surfaced
/// to the caller instead of being replayed against the gateway.
#[derive(Clone)]
pub struct PaymentHttpClient {
    client: Client,
    provider: &'static str,
}

impl PaymentHttpClient {
    pub fn new(provider: &'static str, timeout: Duration) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PaymentError::NetworkError {
                message: format!("failed to initialize HTTP client: {}", e),
            })?;
        Ok(Self { client, provider })
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &JsonValue,
    ) -> PaymentResult<T> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError {
                message: format!("{} request failed: {}", self.provider, e),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError {
                message: format!("{} response unreadable: {}", self.provider, e),
            })?;
        if !status.is_success() {
            warn!(provider = self.provider, status = status.as_u16(), "gateway returned an error status");
            return Err(PaymentError::ProviderError {
                provider: self.provider.to_string(),
                message: format!("HTTP {}: {}", status, text),
                provider_code: Some(status.as_u16().to_string()),
                retryable: status.is_server_error(),
            });
        }

        serde_json::from_str::<T>(&text).map_err(|e| PaymentError::ProviderError {
            provider: self.provider.to_string(),
            message: format!("invalid provider JSON response: {}", e),
            provider_code: None,
            retryable: false,
        })
    }
}

/// Constant-time comparison for checksums
pub fn secure_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0_u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
