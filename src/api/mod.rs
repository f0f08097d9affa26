//! HTTP surface, everything mounted under `/api`

pub mod admin;
pub mod auth;
pub mod contact;
pub mod health;
pub mod menu;
pub mod orders;
pub mod payments;
pub mod paytm;
pub mod reservations;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::de::DeserializeOwned;

use crate::auth::JwtService;
use crate::config::AuthConfig;
use crate::database::Repositories;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::require_admin;
use crate::middleware::error::get_request_id_from_headers;
use crate::payments::PaymentProviderFactory;
use crate::services::{
    AdminService, ContactService, CustomerService, MenuService, OrderService,
    ReservationService,
};

/// Shared handler state, cloned per request
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub jwt: JwtService,
    pub menu: Arc<MenuService>,
    pub orders: Arc<OrderService>,
    pub reservations: Arc<ReservationService>,
    pub contact: Arc<ContactService>,
    pub customers: Arc<CustomerService>,
    pub admin: Arc<AdminService>,
    pub payments: PaymentProviderFactory,
}

impl AppState {
    pub fn new(
        auth: &AuthConfig,
        repos: Repositories,
        payments: PaymentProviderFactory,
    ) -> AppResult<Self> {
        let jwt = JwtService::new(&auth.jwt_secret);
        Ok(Self {
            menu: Arc::new(MenuService::new(repos.menu.clone())),
            orders: Arc::new(OrderService::new(repos.orders.clone())),
            reservations: Arc::new(ReservationService::new(repos.reservations.clone())),
            contact: Arc::new(ContactService::new(repos.contacts.clone())),
            customers: Arc::new(CustomerService::new(
                repos.customers.clone(),
                jwt.clone(),
                auth.customer_token_ttl_hours,
            )),
            admin: Arc::new(AdminService::new(auth, jwt.clone(), repos.clone())?),
            payments,
            jwt,
            repos,
        })
    }
}

/// Request id of the current request, used to tag errors raised inside handlers
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn tag(&self, err: impl Into<AppError>) -> AppError {
        let err = err.into();
        match &self.request_id {
            Some(id) if err.request_id.is_none() => err.with_request_id(id.clone()),
            _ => err,
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            request_id: get_request_id_from_headers(&parts.headers),
        })
    }
}

/// `Json` whose rejections render as [`AppError`] validation failures
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = RequestContext {
            request_id: get_request_id_from_headers(req.headers()),
        };
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(ctx.tag(json_rejection(rejection))),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    let reason = match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "expected `Content-Type: application/json`".to_string()
        }
        other => other.body_text(),
    };
    AppError::invalid_field("body", reason)
}

pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/verify", get(admin::verify))
        .route("/stats", get(admin::stats))
        .route("/menu", post(admin::add_menu_item))
        .route("/menu/{id}", patch(admin::update_menu_item))
        .route("/menu/{id}/toggle", patch(admin::toggle_menu_item))
        .route("/orders/{id}/status", patch(admin::update_order_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route("/login", post(admin::login));

    let api = Router::new()
        .route("/health", get(health::health))
        .route("/menu", get(menu::list))
        .route("/menu/search", get(menu::search))
        .route("/menu/category/{category}", get(menu::by_category))
        .route("/orders", post(orders::create).get(orders::list))
        .route("/orders/mine", get(orders::mine))
        .route(
            "/reservations",
            post(reservations::create).get(reservations::list),
        )
        .route("/reservations/{id}/status", patch(reservations::update_status))
        .route("/contact", post(contact::submit))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/profile", get(auth::profile))
        .route("/payment/create-order", post(payments::create_order))
        .route("/payment/verify", post(payments::verify))
        .route("/payment/upi", get(payments::upi_target))
        .route("/paytm/initiate", post(paytm::initiate))
        .route("/paytm/verify", post(paytm::verify))
        .route("/paytm/callback", post(paytm::callback))
        .route("/paytm/status/{order_id}", get(paytm::status))
        .nest("/admin", admin_routes);

    Router::new().nest("/api", api).with_state(state)
}
