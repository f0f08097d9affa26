//! Checksum-signed redirect gateway endpoints

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::FormRejection, Path, State},
    response::Redirect,
    Form, Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::api::payments::{flatten_fields, unexpected_initiation};
use crate::api::{AppJson, AppState, RequestContext};
use crate::error::AppError;
use crate::payments::types::{CustomerContact, PaymentInitiation, PaymentRequest, VerifyRequest};
use crate::payments::{PaymentProvider, ProviderName};
use crate::services::PaymentOutcome;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub order_id: Option<String>,
    pub amount: Option<Decimal>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
}

pub async fn initiate(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(request): AppJson<InitiateRequest>,
) -> Result<Json<Value>, AppError> {
    let amount = request
        .amount
        .ok_or_else(|| ctx.tag(AppError::missing_field("amount")))?;
    let initiation = state
        .payments
        .paytm()
        .initiate(PaymentRequest {
            order_id: request.order_id,
            amount,
            customer: CustomerContact {
                email: request.customer_email,
                phone: request.customer_phone,
            },
        })
        .await
        .map_err(|e| ctx.tag(e))?;

    let PaymentInitiation::Redirect(redirect) = initiation else {
        return Err(ctx.tag(unexpected_initiation(ProviderName::Paytm)));
    };
    Ok(Json(json!({
        "success": true,
        "paytmParams": {
            "body": redirect.body,
            "head": { "signature": redirect.signature },
        },
        "paytmUrl": redirect.redirect_url,
        "orderId": redirect.order_id,
    })))
}

pub async fn verify(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(fields): AppJson<BTreeMap<String, Value>>,
) -> Result<Json<Value>, AppError> {
    let result = state
        .payments
        .paytm()
        .verify(VerifyRequest::new(flatten_fields(fields)))
        .await
        .map_err(|e| ctx.tag(e))?;

    if !result.verified {
        return Ok(Json(json!({
            "success": false,
            "verified": false,
            "message": result.message.unwrap_or_default(),
        })));
    }
    Ok(Json(json!({
        "success": true,
        "verified": true,
        "orderId": result.order_id,
        "status": result.status,
        "transactionId": result.transaction_id,
        "amount": result.amount,
        "responseCode": result.response_code,
        "message": result.message,
    })))
}

/// Browser POST from the gateway. Always answers with a redirect to the storefront.
pub async fn callback(
    State(state): State<AppState>,
    form: Result<Form<BTreeMap<String, String>>, FormRejection>,
) -> Redirect {
    let paytm = state.payments.paytm();
    let outcome = match form {
        Ok(Form(fields)) => paytm.verify_callback(fields),
        Err(rejection) => {
            warn!(error = %rejection, "unreadable paytm callback");
            None
        }
    };

    if let Some(outcome) = &outcome {
        let payment = PaymentOutcome {
            success: outcome.is_success(),
            transaction_id: Some(outcome.transaction_id.clone()).filter(|t| !t.is_empty()),
        };
        // The storefront still creates the order on return; a failure here only skips
        // the server-side reconciliation
        if let Err(e) = state.orders.record_payment(&outcome.order_id, &payment).await {
            error!(order_id = %outcome.order_id, error = %e, "failed to reconcile callback");
        }
    }

    Redirect::to(&paytm.callback_redirect(outcome.as_ref()))
}

/// Provider view of the order, passed through unmodified
pub async fn status(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(order_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let status = state
        .payments
        .paytm()
        .check_status(&order_id)
        .await
        .map_err(|e| ctx.tag(e))?;
    Ok(Json(status))
}
