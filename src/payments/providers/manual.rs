//! Manual UPI transfer: the customer pays a fixed VPA and types in the reference.
//!
//! Nothing is checked with any gateway; a non-empty reference is the whole proof.

use crate::config::UpiConfig;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PaymentProvider;
use crate::payments::types::{
    validate_amount, PaymentInitiation, PaymentRequest, ProviderName, UpiTarget,
    VerificationResult, VerifyRequest, CURRENCY,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

/// Field carrying the customer-entered UPI reference
pub const REFERENCE_FIELD: &str = "reference";

#[derive(Debug, Clone)]
pub struct ManualUpiProvider {
    config: UpiConfig,
}

impl ManualUpiProvider {
    pub fn new(config: UpiConfig) -> Self {
        Self { config }
    }

    pub fn target(&self, amount: Decimal) -> PaymentResult<UpiTarget> {
        validate_amount(amount, "amount")?;
        let amount = amount.normalize();
        let upi_uri = reqwest::Url::parse_with_params(
            "upi://pay",
            &[
                ("pa", self.config.vpa.as_str()),
                ("pn", self.config.payee_name.as_str()),
                ("am", amount.to_string().as_str()),
                ("cu", CURRENCY),
            ],
        )
        .map_err(|e| PaymentError::validation(format!("invalid UPI target: {}", e), "vpa"))?;

        Ok(UpiTarget {
            vpa: self.config.vpa.clone(),
            payee_name: self.config.payee_name.clone(),
            amount,
            currency: CURRENCY.to_string(),
            upi_uri: upi_uri.to_string(),
        })
    }
}

#[async_trait]
impl PaymentProvider for ManualUpiProvider {
    fn name(&self) -> ProviderName {
        ProviderName::ManualUpi
    }

    async fn initiate(&self, request: PaymentRequest) -> PaymentResult<PaymentInitiation> {
        Ok(PaymentInitiation::ManualTarget(self.target(request.amount)?))
    }

    async fn verify(&self, request: VerifyRequest) -> PaymentResult<VerificationResult> {
        match request.field(REFERENCE_FIELD) {
            Some(reference) => Ok(VerificationResult {
                verified: true,
                trusted: false,
                transaction_id: Some(reference.to_string()),
                message: Some("Reference recorded".to_string()),
                ..VerificationResult::default()
            }),
            None => Err(PaymentError::validation(
                "UPI transaction reference is required",
                REFERENCE_FIELD,
            )),
        }
    }

    async fn check_status(&self, order_id: &str) -> PaymentResult<JsonValue> {
        Ok(serde_json::json!({
            "orderId": order_id,
            "status": "UNVERIFIED",
            "message": "Manual UPI payments are confirmed by the customer-entered reference",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn provider() -> ManualUpiProvider {
        ManualUpiProvider::new(UpiConfig {
            vpa: "bambooyardcafe@paytm".to_string(),
            payee_name: "Bamboo Yard Cafe".to_string(),
        })
    }

    #[test]
    fn target_builds_upi_link() {
        let target = provider().target(Decimal::from(500)).unwrap();
        assert_eq!(target.vpa, "bambooyardcafe@paytm");
        assert!(target.upi_uri.starts_with("upi://pay?"));
        assert!(target.upi_uri.contains("pa=bambooyardcafe%40paytm"));
        assert!(target.upi_uri.contains("am=500"));
        assert!(target.upi_uri.contains("cu=INR"));
    }

    #[tokio::test]
    async fn blank_reference_is_rejected() {
        let mut fields = BTreeMap::new();
        fields.insert(REFERENCE_FIELD.to_string(), "   ".to_string());
        assert!(provider().verify(VerifyRequest::new(fields)).await.is_err());
    }

    #[tokio::test]
    async fn reference_becomes_transaction_id() {
        let mut fields = BTreeMap::new();
        fields.insert(REFERENCE_FIELD.to_string(), "UPI123456".to_string());
        let result = provider().verify(VerifyRequest::new(fields)).await.unwrap();
        assert!(result.verified);
        assert!(!result.trusted);
        assert_eq!(result.transaction_id.as_deref(), Some("UPI123456"));
    }
}
