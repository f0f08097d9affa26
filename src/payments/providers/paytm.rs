use crate::config::{Environment, PaytmConfig};
use crate::payments::checksum::{generate_signature, verify_form_signature};
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PaymentProvider;
use crate::payments::types::{
    validate_amount, PaymentInitiation, PaymentRequest, ProviderName, RedirectBody,
    RedirectInitiation, TxnAmount, UserInfo, VerificationResult, VerifyRequest, CURRENCY,
};
use crate::payments::utils::PaymentHttpClient;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

pub const CHECKSUM_FIELD: &str = "CHECKSUMHASH";
pub const SUCCESS_STATUS: &str = "TXN_SUCCESS";

const STAGING_INITIATE_URL: &str = "https://securegw-stage.paytm.in/theia/api/v1/initiateTransaction";
const PRODUCTION_INITIATE_URL: &str = "https://securegw.paytm.in/theia/api/v1/initiateTransaction";
const STAGING_STATUS_URL: &str = "https://securegw-stage.paytm.in/v3/order/status";
const PRODUCTION_STATUS_URL: &str = "https://securegw.paytm.in/v3/order/status";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody<'a> {
    mid: &'a str,
    order_id: &'a str,
}

/// Callback fields after checksum verification
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackOutcome {
    pub order_id: String,
    pub status: String,
    pub transaction_id: String,
}

impl CallbackOutcome {
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }
}

pub struct PaytmProvider {
    config: PaytmConfig,
    http: PaymentHttpClient,
    initiate_url: String,
    status_url: String,
}

impl PaytmProvider {
    pub fn new(config: PaytmConfig) -> PaymentResult<Self> {
        // Gateway calls are never retried
        let http = PaymentHttpClient::new("paytm", Duration::from_secs(config.timeout_secs))?;
        let (initiate_url, status_url) = match config.environment {
            Environment::Production => (PRODUCTION_INITIATE_URL, PRODUCTION_STATUS_URL),
            Environment::Staging => (STAGING_INITIATE_URL, STAGING_STATUS_URL),
        };
        Ok(Self {
            config,
            http,
            initiate_url: initiate_url.to_string(),
            status_url: status_url.to_string(),
        })
    }

    /// Point the status query somewhere else (local fakes in tests)
    pub fn with_status_url(mut self, url: impl Into<String>) -> Self {
        self.status_url = url.into();
        self
    }

    pub fn initiate_url(&self) -> &str {
        &self.initiate_url
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn ensure_configured(&self) -> PaymentResult<()> {
        if !self.config.is_configured() {
            return Err(PaymentError::NotConfigured {
                provider: "paytm".to_string(),
            });
        }
        Ok(())
    }

    /// Checksum-verified callback fields, `None` when the checksum is missing or wrong
    pub fn verify_callback(&self, mut fields: BTreeMap<String, String>) -> Option<CallbackOutcome> {
        let checksum = fields.remove(CHECKSUM_FIELD)?;
        if !verify_form_signature(&fields, &self.config.merchant_key, &checksum) {
            warn!(
                order_id = fields.get("ORDERID").map(String::as_str).unwrap_or("-"),
                "paytm callback failed checksum verification"
            );
            return None;
        }
        let get = |k: &str| fields.get(k).cloned().unwrap_or_default();
        Some(CallbackOutcome {
            order_id: get("ORDERID"),
            status: get("STATUS"),
            transaction_id: get("TXNID"),
        })
    }

    /// Where the customer's browser goes after the gateway posts back
    pub fn callback_redirect(&self, outcome: Option<&CallbackOutcome>) -> String {
        let base = format!(
            "{}/payment-status",
            self.config.frontend_url.trim_end_matches('/')
        );
        let url = match outcome {
            Some(outcome) => reqwest::Url::parse_with_params(
                &base,
                &[
                    ("orderId", outcome.order_id.as_str()),
                    ("status", outcome.status.as_str()),
                    ("txnId", outcome.transaction_id.as_str()),
                ],
            ),
            None => reqwest::Url::parse_with_params(&base, &[("status", "FAILED")]),
        };
        match url {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(error = %e, "FRONTEND_URL is not a valid URL");
                format!("{}?status=FAILED", base)
            }
        }
    }
}

#[async_trait]
impl PaymentProvider for PaytmProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Paytm
    }

    async fn initiate(&self, request: PaymentRequest) -> PaymentResult<PaymentInitiation> {
        self.ensure_configured()?;
        validate_amount(request.amount, "amount")?;
        let order_id = request
            .order_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| PaymentError::validation("orderId is required", "orderId"))?;
        let email = request.customer.email.unwrap_or_default();
        let phone = request.customer.phone.unwrap_or_default();

        let body = RedirectBody {
            request_type: "Payment".to_string(),
            mid: self.config.mid.clone(),
            website_name: self.config.website.clone(),
            order_id: order_id.clone(),
            callback_url: self.config.callback_url.clone(),
            txn_amount: TxnAmount {
                value: request.amount.normalize().to_string(),
                currency: CURRENCY.to_string(),
            },
            user_info: UserInfo {
                cust_id: email.clone(),
                mobile: phone,
                email,
            },
        };

        let serialized = serde_json::to_string(&body).map_err(|e| PaymentError::ProviderError {
            provider: "paytm".to_string(),
            message: format!("failed to serialize body: {}", e),
            provider_code: None,
            retryable: false,
        })?;
        let signature = generate_signature(&serialized, &self.config.merchant_key)?;

        info!(order_id = %order_id, amount = %request.amount, "paytm transaction initiated");

        Ok(PaymentInitiation::Redirect(RedirectInitiation {
            order_id,
            body,
            signature,
            redirect_url: self.initiate_url.clone(),
        }))
    }

    async fn verify(&self, request: VerifyRequest) -> PaymentResult<VerificationResult> {
        let fields = request.fields.clone();
        if self.verify_callback(fields).is_none() {
            return Ok(VerificationResult::rejected("Checksum verification failed"));
        }

        let own = |k: &str| request.fields.get(k).cloned();
        Ok(VerificationResult {
            verified: true,
            trusted: true,
            order_id: own("ORDERID"),
            status: own("STATUS"),
            transaction_id: own("TXNID"),
            amount: own("TXNAMOUNT"),
            response_code: own("RESPCODE"),
            message: own("RESPMSG"),
        })
    }

    async fn check_status(&self, order_id: &str) -> PaymentResult<JsonValue> {
        self.ensure_configured()?;
        let body = StatusBody {
            mid: &self.config.mid,
            order_id,
        };
        let serialized = serde_json::to_string(&body).map_err(|e| PaymentError::ProviderError {
            provider: "paytm".to_string(),
            message: format!("failed to serialize status body: {}", e),
            provider_code: None,
            retryable: false,
        })?;
        let signature = generate_signature(&serialized, &self.config.merchant_key)?;

        // `mid` < `orderId`, so the map keeps the signed field order
        let envelope = serde_json::json!({
            "body": { "mid": body.mid, "orderId": body.order_id },
            "head": { "signature": signature },
        });

        info!(order_id = %order_id, "querying paytm order status");
        self.http.post_json(&self.status_url, &envelope).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::checksum::{generate_form_signature, verify_signature};
    use rust_decimal::Decimal;

    const KEY: &str = "test-merchant-k1";

    fn config() -> PaytmConfig {
        PaytmConfig {
            mid: "MID123".to_string(),
            merchant_key: KEY.to_string(),
            website: "WEBSTAGING".to_string(),
            channel_id: "WEB".to_string(),
            industry_type: "Retail".to_string(),
            callback_url: "http://localhost:5000/api/paytm/callback".to_string(),
            frontend_url: "http://localhost:5173/".to_string(),
            timeout_secs: 5,
            environment: Environment::Staging,
        }
    }

    fn signed_callback(status: &str) -> BTreeMap<String, String> {
        let mut fields: BTreeMap<String, String> = [
            ("ORDERID", "ORDER_1700000000000"),
            ("STATUS", status),
            ("TXNID", "TXN 42&x"),
            ("TXNAMOUNT", "500.00"),
            ("RESPCODE", "01"),
            ("RESPMSG", "Txn Success"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let checksum = generate_form_signature(&fields, KEY).unwrap();
        fields.insert(CHECKSUM_FIELD.to_string(), checksum);
        fields
    }

    #[tokio::test]
    async fn initiate_signs_exact_body() {
        let provider = PaytmProvider::new(config()).unwrap();
        let initiation = provider
            .initiate(PaymentRequest {
                order_id: Some("ORDER_1".to_string()),
                amount: Decimal::from(500),
                customer: crate::payments::types::CustomerContact {
                    email: Some("asha@example.com".to_string()),
                    phone: Some("9876543210".to_string()),
                },
            })
            .await
            .unwrap();
        let PaymentInitiation::Redirect(redirect) = initiation else {
            panic!("expected redirect");
        };

        let serialized = serde_json::to_string(&redirect.body).unwrap();
        assert!(serialized.starts_with(r#"{"requestType":"Payment","mid":"MID123","websiteName":"WEBSTAGING","orderId":"ORDER_1""#));
        assert!(serialized.contains(r#""txnAmount":{"value":"500","currency":"INR"}"#));
        assert!(verify_signature(&serialized, KEY, &redirect.signature));
        assert_eq!(redirect.redirect_url, STAGING_INITIATE_URL);
    }

    #[tokio::test]
    async fn production_uses_live_endpoint() {
        let mut cfg = config();
        cfg.environment = Environment::Production;
        let provider = PaytmProvider::new(cfg).unwrap();
        assert_eq!(provider.initiate_url(), PRODUCTION_INITIATE_URL);
    }

    #[tokio::test]
    async fn initiate_requires_credentials() {
        let mut cfg = config();
        cfg.merchant_key.clear();
        let err = PaytmProvider::new(cfg)
            .unwrap()
            .initiate(PaymentRequest {
                order_id: Some("ORDER_1".to_string()),
                amount: Decimal::from(1),
                customer: Default::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotConfigured { .. }));
    }

    #[test]
    fn verified_callback_redirects_with_encoded_values() {
        let provider = PaytmProvider::new(config()).unwrap();
        let outcome = provider.verify_callback(signed_callback(SUCCESS_STATUS)).unwrap();
        assert!(outcome.is_success());
        let url = provider.callback_redirect(Some(&outcome));
        assert_eq!(
            url,
            "http://localhost:5173/payment-status?orderId=ORDER_1700000000000&status=TXN_SUCCESS&txnId=TXN+42%26x"
        );
    }

    #[test]
    fn tampered_callback_redirects_to_failure() {
        let provider = PaytmProvider::new(config()).unwrap();
        let mut fields = signed_callback("TXN_FAILURE");
        fields.insert("STATUS".to_string(), SUCCESS_STATUS.to_string());
        let outcome = provider.verify_callback(fields);
        assert!(outcome.is_none());
        assert_eq!(
            provider.callback_redirect(outcome.as_ref()),
            "http://localhost:5173/payment-status?status=FAILED"
        );
    }

    #[test]
    fn missing_checksum_is_rejected() {
        let provider = PaytmProvider::new(config()).unwrap();
        let mut fields = signed_callback(SUCCESS_STATUS);
        fields.remove(CHECKSUM_FIELD);
        assert!(provider.verify_callback(fields).is_none());
    }

    #[tokio::test]
    async fn verify_reports_gateway_fields() {
        let provider = PaytmProvider::new(config()).unwrap();
        let result = provider
            .verify(VerifyRequest::new(signed_callback(SUCCESS_STATUS)))
            .await
            .unwrap();
        assert!(result.verified && result.trusted);
        assert_eq!(result.amount.as_deref(), Some("500.00"));
        assert_eq!(result.response_code.as_deref(), Some("01"));

        let mut forged = signed_callback(SUCCESS_STATUS);
        forged.insert("TXNAMOUNT".to_string(), "1.00".to_string());
        let result = provider.verify(VerifyRequest::new(forged)).await.unwrap();
        assert!(!result.verified);
        assert_eq!(result.message.as_deref(), Some("Checksum verification failed"));
    }

    #[tokio::test]
    async fn status_query_network_failure_is_not_retried() {
        let provider = PaytmProvider::new(config())
            .unwrap()
            .with_status_url("http://127.0.0.1:9/v3/order/status");
        let started = std::time::Instant::now();
        let err = provider.check_status("ORDER_1").await.unwrap_err();
        assert!(matches!(err, PaymentError::NetworkError { .. }));
        // A single attempt against a closed port fails fast
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
