use crate::models::PaymentMethod;
use crate::payments::error::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

pub const CURRENCY: &str = "INR";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderName {
    /// Placeholder gateway behind the `online` method
    Stub,
    Paytm,
    /// Static UPI target, confirmed by the customer
    ManualUpi,
}

impl ProviderName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderName::Stub => "stub",
            ProviderName::Paytm => "paytm",
            ProviderName::ManualUpi => "manual_upi",
        }
    }

    /// Gateway that settles the given order payment method, `None` for cash
    pub fn for_method(method: PaymentMethod) -> Option<Self> {
        match method {
            PaymentMethod::Online => Some(ProviderName::Stub),
            PaymentMethod::Paytm => Some(ProviderName::Paytm),
            PaymentMethod::Upi => Some(ProviderName::ManualUpi),
            PaymentMethod::Cod => None,
        }
    }
}

impl std::fmt::Display for ProviderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = PaymentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "stub" | "online" | "razorpay" => Ok(ProviderName::Stub),
            "paytm" => Ok(ProviderName::Paytm),
            "manual_upi" | "upi" => Ok(ProviderName::ManualUpi),
            _ => Err(PaymentError::validation(
                format!("unsupported provider: {}", value),
                "provider",
            )),
        }
    }
}

pub fn validate_amount(amount: Decimal, field: &str) -> Result<(), PaymentError> {
    if amount <= Decimal::ZERO {
        return Err(PaymentError::validation(
            "amount must be greater than zero",
            field,
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerContact {
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Merchant-side order id; required by the redirect gateway only
    pub order_id: Option<String>,
    pub amount: Decimal,
    pub customer: CustomerContact,
}

/// Synthetic order descriptor returned by the stub gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StubOrder {
    pub id: String,
    /// Minor units (paise)
    pub amount: Decimal,
    pub currency: String,
    pub receipt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxnAmount {
    pub value: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub cust_id: String,
    pub mobile: String,
    pub email: String,
}

/// Transaction body of the redirect gateway. Field order is part of the signed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectBody {
    pub request_type: String,
    pub mid: String,
    pub website_name: String,
    pub order_id: String,
    pub callback_url: String,
    pub txn_amount: TxnAmount,
    pub user_info: UserInfo,
}

impl RedirectBody {
    /// Hidden form fields: scalars as-is, nested objects as JSON text
    pub fn form_fields(&self) -> Result<Vec<(String, String)>, serde_json::Error> {
        Ok(vec![
            ("requestType".to_string(), self.request_type.clone()),
            ("mid".to_string(), self.mid.clone()),
            ("websiteName".to_string(), self.website_name.clone()),
            ("orderId".to_string(), self.order_id.clone()),
            ("callbackUrl".to_string(), self.callback_url.clone()),
            ("txnAmount".to_string(), serde_json::to_string(&self.txn_amount)?),
            ("userInfo".to_string(), serde_json::to_string(&self.user_info)?),
        ])
    }
}

/// Everything the browser needs to POST into the checksum gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectInitiation {
    pub order_id: String,
    pub body: RedirectBody,
    pub signature: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpiTarget {
    pub vpa: String,
    pub payee_name: String,
    pub amount: Decimal,
    pub currency: String,
    /// `upi://pay?...` deep link, also rendered as a QR code
    pub upi_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentInitiation {
    StubOrder(StubOrder),
    Redirect(RedirectInitiation),
    ManualTarget(UpiTarget),
}

/// Flat field map posted back by a gateway (or entered by the customer)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub fields: BTreeMap<String, String>,
}

impl VerifyRequest {
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    /// Non-blank field value
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub verified: bool,
    /// False when `verified` is not backed by any cryptographic or gateway check
    pub trusted: bool,
    pub order_id: Option<String>,
    pub status: Option<String>,
    pub transaction_id: Option<String>,
    pub amount: Option<String>,
    pub response_code: Option<String>,
    pub message: Option<String>,
}

impl VerificationResult {
    pub fn rejected(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_for_payment_method() {
        assert_eq!(ProviderName::for_method(PaymentMethod::Online), Some(ProviderName::Stub));
        assert_eq!(ProviderName::for_method(PaymentMethod::Upi), Some(ProviderName::ManualUpi));
        assert_eq!(ProviderName::for_method(PaymentMethod::Cod), None);
    }

    #[test]
    fn provider_name_parsing_works() {
        assert!(matches!(ProviderName::from_str("Paytm"), Ok(ProviderName::Paytm)));
        assert!(ProviderName::from_str("unknown").is_err());
    }

    #[test]
    fn initiation_is_tagged() {
        let json = serde_json::to_value(PaymentInitiation::StubOrder(StubOrder {
            id: "order_1".to_string(),
            amount: Decimal::from(50000),
            currency: CURRENCY.to_string(),
            receipt: "receipt_1".to_string(),
        }))
        .unwrap();
        assert_eq!(json["kind"], "stub_order");
        assert_eq!(json["currency"], "INR");
    }

    #[test]
    fn blank_fields_are_absent() {
        let mut fields = BTreeMap::new();
        fields.insert("STATUS".to_string(), "  ".to_string());
        fields.insert("TXNID".to_string(), "T1".to_string());
        let request = VerifyRequest::new(fields);
        assert_eq!(request.field("STATUS"), None);
        assert_eq!(request.field("TXNID"), Some("T1"));
    }

    #[test]
    fn form_fields_keep_nested_order() {
        let body = RedirectBody {
            request_type: "Payment".to_string(),
            mid: "MID".to_string(),
            website_name: "WEBSTAGING".to_string(),
            order_id: "ORDER_1".to_string(),
            callback_url: "http://localhost/cb".to_string(),
            txn_amount: TxnAmount {
                value: "500".to_string(),
                currency: CURRENCY.to_string(),
            },
            user_info: UserInfo {
                cust_id: "a@b.c".to_string(),
                mobile: "9000000000".to_string(),
                email: "a@b.c".to_string(),
            },
        };
        let fields = body.form_fields().unwrap();
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[5].1, r#"{"value":"500","currency":"INR"}"#);
        assert_eq!(fields[6].1, r#"{"custId":"a@b.c","mobile":"9000000000","email":"a@b.c"}"#);
    }

    #[test]
    fn amount_must_be_positive() {
        assert!(validate_amount(Decimal::ZERO, "amount").is_err());
        assert!(validate_amount(Decimal::from(1), "amount").is_ok());
    }
}
