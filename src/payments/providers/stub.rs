//! Placeholder card gateway behind the `online` payment method.
//!
//! No external call is ever made. `verify` accepts anything and says so: the result is
//! marked untrusted and every call logs a warning. Do not settle orders on it.

use crate::payments::error::PaymentResult;
use crate::payments::provider::PaymentProvider;
use crate::payments::types::{
    validate_amount, PaymentInitiation, PaymentRequest, ProviderName, StubOrder,
    VerificationResult, VerifyRequest, CURRENCY,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct StubGatewayProvider;

impl StubGatewayProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentProvider for StubGatewayProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Stub
    }

    async fn initiate(&self, request: PaymentRequest) -> PaymentResult<PaymentInitiation> {
        validate_amount(request.amount, "amount")?;
        let now = chrono::Utc::now().timestamp_millis();
        let order = StubOrder {
            id: format!("order_{}", now),
            amount: request.amount * Decimal::from(100),
            currency: CURRENCY.to_string(),
            receipt: format!("receipt_{}", now),
        };
        info!(order_id = %order.id, "stub payment order created");
        Ok(PaymentInitiation::StubOrder(order))
    }

    async fn verify(&self, request: VerifyRequest) -> PaymentResult<VerificationResult> {
        warn!(
            order_id = request.field("razorpay_order_id").unwrap_or("-"),
            payment_id = request.field("razorpay_payment_id").unwrap_or("-"),
            has_signature = request.field("razorpay_signature").is_some(),
            "stub gateway verification is not a security check; result is untrusted"
        );
        Ok(VerificationResult {
            verified: true,
            trusted: false,
            order_id: request.field("razorpay_order_id").map(str::to_string),
            transaction_id: request.field("razorpay_payment_id").map(str::to_string),
            message: Some("Payment verified".to_string()),
            ..VerificationResult::default()
        })
    }

    async fn check_status(&self, order_id: &str) -> PaymentResult<JsonValue> {
        Ok(serde_json::json!({
            "orderId": order_id,
            "status": "unknown",
            "trusted": false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn amount_is_scaled_to_paise() {
        let initiation = StubGatewayProvider::new()
            .initiate(PaymentRequest {
                order_id: None,
                amount: Decimal::new(2505, 1),
                customer: Default::default(),
            })
            .await
            .unwrap();
        let PaymentInitiation::StubOrder(order) = initiation else {
            panic!("expected stub order");
        };
        assert_eq!(order.amount, Decimal::from(25050));
        assert_eq!(order.currency, "INR");
        assert!(order.id.starts_with("order_"));
        assert!(order.receipt.starts_with("receipt_"));
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let result = StubGatewayProvider::new()
            .initiate(PaymentRequest {
                order_id: None,
                amount: Decimal::ZERO,
                customer: Default::default(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn verify_is_always_untrusted() {
        let mut fields = BTreeMap::new();
        fields.insert("razorpay_signature".to_string(), "forged".to_string());
        let result = StubGatewayProvider::new()
            .verify(VerifyRequest::new(fields))
            .await
            .unwrap();
        assert!(result.verified);
        assert!(!result.trusted);
    }
}
