use crate::payments::error::PaymentResult;
use crate::payments::types::{
    PaymentInitiation, PaymentRequest, ProviderName, VerificationResult, VerifyRequest,
};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    fn name(&self) -> ProviderName;

    /// Start a payment; what comes back depends on how the gateway hands over control
    async fn initiate(&self, request: PaymentRequest) -> PaymentResult<PaymentInitiation>;

    /// Check what the gateway (or the customer) sent back
    async fn verify(&self, request: VerifyRequest) -> PaymentResult<VerificationResult>;

    /// Provider view of an order, passed through unmodified
    async fn check_status(&self, order_id: &str) -> PaymentResult<JsonValue>;
}
