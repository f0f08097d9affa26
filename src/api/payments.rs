//! Card gateway (`online` payment method) and manual UPI endpoints

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::{
    extract::{Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{AppJson, AppState, RequestContext};
use crate::error::AppError;
use crate::models::PaymentMethod;
use crate::payments::types::{PaymentInitiation, PaymentRequest, StubOrder, UpiTarget, VerifyRequest};
use crate::payments::ProviderName;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct UpiQuery {
    pub amount: Option<String>,
}

pub(crate) fn unexpected_initiation(provider: ProviderName) -> AppError {
    AppError::new(crate::error::AppErrorKind::External(
        crate::error::ExternalError::PaymentGateway {
            provider: provider.to_string(),
            message: "provider returned an unexpected initiation kind".to_string(),
            is_retryable: false,
        },
    ))
}

pub async fn create_order(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(request): AppJson<CreateOrderRequest>,
) -> Result<Json<StubOrder>, AppError> {
    let amount = request
        .amount
        .ok_or_else(|| ctx.tag(AppError::missing_field("amount")))?;
    let provider = state
        .payments
        .for_method(PaymentMethod::Online)
        .map_err(|e| ctx.tag(e))?;
    let initiation = provider
        .initiate(PaymentRequest {
            order_id: None,
            amount,
            customer: Default::default(),
        })
        .await
        .map_err(|e| ctx.tag(e))?;

    match initiation {
        PaymentInitiation::StubOrder(order) => Ok(Json(order)),
        _ => Err(ctx.tag(unexpected_initiation(provider.name()))),
    }
}

/// Always "verified", never trusted: the stub does not check the signature
pub async fn verify(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(fields): AppJson<BTreeMap<String, Value>>,
) -> Result<Json<Value>, AppError> {
    let provider = state
        .payments
        .for_method(PaymentMethod::Online)
        .map_err(|e| ctx.tag(e))?;
    let result = provider
        .verify(VerifyRequest::new(flatten_fields(fields)))
        .await
        .map_err(|e| ctx.tag(e))?;
    Ok(Json(json!({
        "success": result.verified,
        "message": result.message.unwrap_or_default(),
        "trusted": result.trusted,
    })))
}

pub async fn upi_target(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<UpiQuery>,
) -> Result<Json<UpiTarget>, AppError> {
    let raw = query
        .amount
        .ok_or_else(|| ctx.tag(AppError::missing_field("amount")))?;
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| ctx.tag(AppError::invalid_field("amount", "not a number")))?;
    let target = state.payments.manual_upi().target(amount).map_err(|e| ctx.tag(e))?;
    Ok(Json(target))
}

/// Gateway fields as strings; `null` becomes empty and nested values keep their JSON text
pub(crate) fn flatten_fields(fields: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    fields
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::Null => String::new(),
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_keeps_scalars_as_text() {
        let fields: BTreeMap<String, Value> = serde_json::from_value(json!({
            "ORDERID": "ORDER_1",
            "TXNAMOUNT": 500,
            "BANKTXNID": null,
        }))
        .unwrap();
        let flat = flatten_fields(fields);
        assert_eq!(flat["ORDERID"], "ORDER_1");
        assert_eq!(flat["TXNAMOUNT"], "500");
        assert_eq!(flat["BANKTXNID"], "");
    }
}
