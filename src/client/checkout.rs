//! Checkout Orchestrator
//!
//! Drives a cart through delivery details and payment into a placed order:
//!
//! ```text
//! BrowsingCart -> EnteringDeliveryDetails -> SelectingPaymentMethod
//!     -> PlacingCodOrder | AwaitingManualUpiConfirmation | RedirectingToGateway
//!     -> OrderPlaced | PaymentFailed
//! ```
//!
//! The gateway path leaves the process: the order is staged under its gateway order id
//! before the redirect, and [`Checkout::handle_payment_return`] (usually on a freshly
//! loaded checkout) turns the staged record into an order only when the gateway
//! reported success.

use crate::client::api::{ApiError, GatewayRequest, StorefrontApi};
use crate::client::cart::{Cart, CartError};
use crate::client::pending_order::PendingOrderStore;
use crate::client::storage::{ClientStorage, StorageError};
use crate::config::CheckoutConfig;
use crate::logging::mask_phone;
use crate::models::{next_time_id, Order, OrderType, PaymentMethod, PaymentStatus, PublicCustomer};
use crate::payments::providers::paytm::SUCCESS_STATUS;
use crate::payments::types::{RedirectInitiation, UpiTarget};
use crate::services::{NewOrder, SessionResponse};
use chrono::Utc;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{info, warn};

/// Hidden form field carrying the body signature
pub const GATEWAY_CHECKSUM_FIELD: &str = "checksum";

const PAYMENT_FAILED_MESSAGE: &str = "Your payment could not be processed";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("customer is not signed in")]
    NotSignedIn,

    #[error("phone number is missing")]
    MissingPhone,

    #[error("phone number is malformed")]
    InvalidPhone,

    #[error("delivery address is missing")]
    MissingAddress,

    #[error("payment reference is missing")]
    MissingReference,

    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to build gateway form: {0}")]
    GatewayForm(#[from] serde_json::Error),
}

impl CheckoutError {
    /// Message suitable for showing to the customer
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::EmptyCart => "Your cart is empty".to_string(),
            CheckoutError::NotSignedIn => "Please login to place an order".to_string(),
            CheckoutError::MissingPhone => "Please enter your phone number".to_string(),
            CheckoutError::InvalidPhone => "Please enter a valid phone number".to_string(),
            CheckoutError::MissingAddress => "Please enter your delivery address".to_string(),
            CheckoutError::MissingReference => {
                "Please enter the UPI transaction reference".to_string()
            }
            CheckoutError::InvalidState { .. } => {
                "Please restart checkout from your cart".to_string()
            }
            CheckoutError::Api(e) => e.user_message(),
            CheckoutError::Cart(CartError::InvalidSize { name, .. }) => {
                format!("{} is not available in that size", name)
            }
            CheckoutError::Cart(CartError::Unavailable { name }) => {
                format!("{} is currently unavailable", name)
            }
            CheckoutError::Cart(_) | CheckoutError::Storage(_) | CheckoutError::GatewayForm(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

/// Signed-in customer, as returned by signup or login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: PublicCustomer,
}

impl From<SessionResponse> for Session {
    fn from(response: SessionResponse) -> Self {
        Self {
            token: response.token,
            user: response.user,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryDetails {
    pub phone: String,
    pub address: Option<String>,
    pub order_type: OrderType,
}

/// Auto-submitting form that hands the browser over to the gateway
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayForm {
    pub action: String,
    pub fields: Vec<(String, String)>,
}

impl GatewayForm {
    fn from_initiation(initiation: &RedirectInitiation) -> Result<Self, serde_json::Error> {
        let mut fields = initiation.body.form_fields()?;
        fields.push((
            GATEWAY_CHECKSUM_FIELD.to_string(),
            initiation.signature.clone(),
        ));
        Ok(Self {
            action: initiation.redirect_url.clone(),
            fields,
        })
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Query of the payment-status page the gateway callback redirects to
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReturn {
    pub order_id: Option<String>,
    pub status: Option<String>,
    pub txn_id: Option<String>,
}

impl PaymentReturn {
    /// Read `orderId`, `status` and `txnId` from the redirect target
    pub fn from_redirect_url(url: &str) -> Option<Self> {
        let url = Url::parse(url).ok()?;
        let mut parsed = Self::default();
        for (key, value) in url.query_pairs() {
            let value = Some(value.into_owned()).filter(|v| !v.is_empty());
            match key.as_ref() {
                "orderId" => parsed.order_id = value,
                "status" => parsed.status = value,
                "txnId" => parsed.txn_id = value,
                _ => {}
            }
        }
        Some(parsed)
    }

    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(SUCCESS_STATUS)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    BrowsingCart,
    EnteringDeliveryDetails,
    SelectingPaymentMethod,
    PlacingCodOrder,
    AwaitingManualUpiConfirmation { target: UpiTarget },
    RedirectingToGateway { order_id: String },
    /// `order` is `None` when the gateway reported success but nothing was staged
    OrderPlaced { order: Option<Order> },
    PaymentFailed { reason: String },
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutState::BrowsingCart => "browsing the cart",
            CheckoutState::EnteringDeliveryDetails => "entering delivery details",
            CheckoutState::SelectingPaymentMethod => "selecting a payment method",
            CheckoutState::PlacingCodOrder => "placing a cash order",
            CheckoutState::AwaitingManualUpiConfirmation { .. } => "awaiting UPI confirmation",
            CheckoutState::RedirectingToGateway { .. } => "redirecting to the gateway",
            CheckoutState::OrderPlaced { .. } => "order placed",
            CheckoutState::PaymentFailed { .. } => "payment failed",
        }
    }
}

fn phone_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\+?[0-9][0-9 -]{5,18}[0-9]$").ok())
        .as_ref()
}

/// Digits with optional `+`, spaces or dashes; never an email address
pub fn looks_like_phone(value: &str) -> bool {
    let value = value.trim();
    if value.contains('@') {
        return false;
    }
    match phone_pattern() {
        Some(pattern) => pattern.is_match(value),
        None => value.chars().filter(char::is_ascii_digit).count() >= 7,
    }
}

pub struct Checkout {
    api: Arc<dyn StorefrontApi>,
    cart: Cart,
    pending: PendingOrderStore,
    state: CheckoutState,
    session: Option<Session>,
    details: Option<DeliveryDetails>,
}

impl Checkout {
    pub fn new(
        api: Arc<dyn StorefrontApi>,
        storage: Arc<dyn ClientStorage>,
        config: &CheckoutConfig,
    ) -> Result<Self, CheckoutError> {
        let pending = PendingOrderStore::new(storage.clone(), config.pending_order_ttl());
        match pending.purge_expired(Utc::now()) {
            Ok(0) => {}
            Ok(purged) => info!(purged, "dropped expired staged orders"),
            Err(e) => warn!(error = %e, "could not sweep staged orders"),
        }
        Ok(Self {
            api,
            cart: Cart::load(storage)?,
            pending,
            state: CheckoutState::BrowsingCart,
            session: None,
            details: None,
        })
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The cart can only change while it is being browsed
    pub fn cart_mut(&mut self) -> Result<&mut Cart, CheckoutError> {
        self.expect_state("edit the cart", |s| {
            matches!(s, CheckoutState::BrowsingCart | CheckoutState::PaymentFailed { .. })
        })?;
        Ok(&mut self.cart)
    }

    pub fn pending_orders(&self) -> &PendingOrderStore {
        &self.pending
    }

    /// Phone from the customer profile when it is usable as a contact number
    pub fn suggested_phone(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|s| s.user.phone.as_str())
            .filter(|phone| looks_like_phone(phone))
    }

    fn expect_state(
        &self,
        action: &'static str,
        allowed: impl Fn(&CheckoutState) -> bool,
    ) -> Result<(), CheckoutError> {
        if allowed(&self.state) {
            Ok(())
        } else {
            Err(CheckoutError::InvalidState {
                action,
                state: self.state.name(),
            })
        }
    }

    pub fn begin_checkout(&mut self, session: Option<Session>) -> Result<&CheckoutState, CheckoutError> {
        self.expect_state("begin checkout", |s| {
            matches!(s, CheckoutState::BrowsingCart | CheckoutState::PaymentFailed { .. })
        })?;
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let session = session.ok_or(CheckoutError::NotSignedIn)?;

        self.session = Some(session);
        self.details = None;
        self.state = CheckoutState::EnteringDeliveryDetails;
        Ok(&self.state)
    }

    pub fn submit_delivery_details(
        &mut self,
        phone: &str,
        address: Option<&str>,
        order_type: OrderType,
    ) -> Result<&CheckoutState, CheckoutError> {
        self.expect_state("submit delivery details", |s| {
            matches!(s, CheckoutState::EnteringDeliveryDetails)
        })?;
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(CheckoutError::MissingPhone);
        }
        if !looks_like_phone(phone) {
            return Err(CheckoutError::InvalidPhone);
        }
        let address = address.map(str::trim).filter(|a| !a.is_empty());
        if order_type == OrderType::Delivery && address.is_none() {
            return Err(CheckoutError::MissingAddress);
        }

        self.details = Some(DeliveryDetails {
            phone: phone.to_string(),
            address: address.map(str::to_string),
            order_type,
        });
        self.state = CheckoutState::SelectingPaymentMethod;
        Ok(&self.state)
    }

    fn draft_order(
        &self,
        payment_method: PaymentMethod,
        payment_status: PaymentStatus,
    ) -> Result<NewOrder, CheckoutError> {
        let session = self.session.as_ref().ok_or(CheckoutError::NotSignedIn)?;
        let details = self.details.as_ref().ok_or(CheckoutError::MissingPhone)?;
        Ok(NewOrder {
            items: self.cart.order_items(),
            total: self.cart.total(),
            customer_name: Some(session.user.name.clone()),
            customer_email: Some(session.user.email.clone()),
            customer_phone: Some(details.phone.clone()),
            delivery_address: match details.order_type {
                OrderType::Delivery => details.address.clone(),
                OrderType::Pickup => None,
            },
            order_type: details.order_type,
            payment_method,
            payment_status,
            transaction_id: None,
            paytm_transaction_id: None,
            paytm_order_id: None,
        })
    }

    /// The order exists from here on, so cleanup failures are logged rather than returned
    fn order_placed(&mut self, order: Order) -> &CheckoutState {
        self.details = None;
        self.state = CheckoutState::OrderPlaced { order: Some(order) };
        if let Err(e) = self.cart.clear() {
            warn!(error = %e, "order placed but the cart could not be cleared");
        }
        &self.state
    }

    /// Cash on delivery: the order is created with payment still pending
    pub async fn place_cod_order(&mut self) -> Result<&CheckoutState, CheckoutError> {
        self.expect_state("place a cash order", |s| {
            matches!(s, CheckoutState::SelectingPaymentMethod)
        })?;
        let draft = self.draft_order(PaymentMethod::Cod, PaymentStatus::Pending)?;

        self.state = CheckoutState::PlacingCodOrder;
        match self.api.create_order(&draft).await {
            Ok(order) => {
                info!(order_id = %order.id, total = %order.total, "cash order placed");
                Ok(self.order_placed(order))
            }
            Err(e) => {
                warn!(error = %e, "cash order failed");
                self.state = CheckoutState::SelectingPaymentMethod;
                Err(e.into())
            }
        }
    }

    pub async fn choose_manual_upi(&mut self) -> Result<&CheckoutState, CheckoutError> {
        self.expect_state("pay by UPI", |s| {
            matches!(s, CheckoutState::SelectingPaymentMethod)
        })?;
        let target = self.api.upi_target(self.cart.total()).await?;
        self.state = CheckoutState::AwaitingManualUpiConfirmation { target };
        Ok(&self.state)
    }

    /// Customer-asserted UPI payment. The reference is stored, never checked.
    pub async fn confirm_upi(&mut self, reference: &str) -> Result<&CheckoutState, CheckoutError> {
        self.expect_state("confirm a UPI payment", |s| {
            matches!(s, CheckoutState::AwaitingManualUpiConfirmation { .. })
        })?;
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(CheckoutError::MissingReference);
        }
        let mut draft = self.draft_order(PaymentMethod::Upi, PaymentStatus::Completed)?;
        draft.transaction_id = Some(reference.to_string());

        let order = self.api.create_order(&draft).await?;
        info!(order_id = %order.id, "manual UPI order placed");
        Ok(self.order_placed(order))
    }

    /// Initiate the checksum gateway and stage the order for the return trip
    pub async fn start_gateway_payment(&mut self) -> Result<GatewayForm, CheckoutError> {
        self.expect_state("start a gateway payment", |s| {
            matches!(s, CheckoutState::SelectingPaymentMethod)
        })?;
        let mut draft = self.draft_order(PaymentMethod::Paytm, PaymentStatus::Pending)?;
        let order_id = format!("ORDER_{}", next_time_id());
        draft.paytm_order_id = Some(order_id.clone());

        let request = GatewayRequest {
            order_id: order_id.clone(),
            amount: draft.total,
            customer_email: draft.customer_email.clone().unwrap_or_default(),
            customer_phone: draft.customer_phone.clone().unwrap_or_default(),
        };
        let initiation = self.api.initiate_paytm(&request).await?;
        let form = GatewayForm::from_initiation(&initiation)?;
        self.pending.stage(&order_id, &draft)?;

        info!(
            order_id = %order_id,
            phone = %mask_phone(&request.customer_phone),
            amount = %request.amount,
            "redirecting to payment gateway"
        );
        self.state = CheckoutState::RedirectingToGateway { order_id };
        Ok(form)
    }

    /// Landing on the payment-status page after the gateway.
    ///
    /// Only a success status touches the staged record. A failed submission keeps the
    /// record so the return can be replayed.
    pub async fn handle_payment_return(
        &mut self,
        query: &PaymentReturn,
    ) -> Result<&CheckoutState, CheckoutError> {
        if !query.is_success() {
            warn!(
                order_id = query.order_id.as_deref().unwrap_or("-"),
                status = query.status.as_deref().unwrap_or("-"),
                "gateway payment did not succeed"
            );
            self.state = CheckoutState::PaymentFailed {
                reason: PAYMENT_FAILED_MESSAGE.to_string(),
            };
            return Ok(&self.state);
        }

        let staged = match query.order_id.as_deref() {
            Some(order_id) => self.pending.load(order_id)?.map(|r| (order_id, r)),
            None => None,
        };
        let Some((order_id, record)) = staged else {
            // Nothing was submitted, so the cart stays as it is
            info!(
                order_id = query.order_id.as_deref().unwrap_or("-"),
                "gateway success without a staged order"
            );
            self.details = None;
            self.state = CheckoutState::OrderPlaced { order: None };
            return Ok(&self.state);
        };

        let mut order = record.order;
        order.payment_status = PaymentStatus::Completed;
        order.paytm_transaction_id = query.txn_id.clone();
        order.paytm_order_id = Some(order_id.to_string());

        match self.api.create_order(&order).await {
            Ok(created) => {
                info!(order_id = %created.id, paytm_order_id = %order_id, "gateway order placed");
                let order_id = order_id.to_string();
                self.order_placed(created);
                if let Err(e) = self.pending.remove(&order_id) {
                    warn!(paytm_order_id = %order_id, error = %e, "staged order could not be removed");
                }
                Ok(&self.state)
            }
            Err(e) => {
                warn!(paytm_order_id = %order_id, error = %e, "failed to submit paid order");
                self.state = CheckoutState::PaymentFailed {
                    reason: e.user_message(),
                };
                Ok(&self.state)
            }
        }
    }

    /// Abandon checkout and go back to the cart, which is left as it is
    pub fn cancel(&mut self) -> &CheckoutState {
        self.details = None;
        self.state = CheckoutState::BrowsingCart;
        &self.state
    }
}
