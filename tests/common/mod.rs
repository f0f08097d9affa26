#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::Router;
use bambooyard_backend::api::{build_router, AppState};
use bambooyard_backend::config::{AuthConfig, Environment, PaytmConfig, UpiConfig};
use bambooyard_backend::database::store::{DocumentStore, MemoryStore};
use bambooyard_backend::database::Repositories;
use bambooyard_backend::payments::providers::{ManualUpiProvider, PaytmProvider, StubGatewayProvider};
use bambooyard_backend::payments::PaymentProviderFactory;
use http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const JWT_SECRET: &str = "integration-secret-that-is-long-enough";
pub const ADMIN_EMAIL: &str = "admin@bambooyardcafe.com";
pub const ADMIN_PASSWORD: &str = "Admin@123456";
pub const MERCHANT_KEY: &str = "bambooMerchKey16";
pub const FRONTEND_URL: &str = "http://localhost:5173";

pub const MENU: &str = r#"[
    {"id":"1","name":"Veg Fried Rice","category":"fried-rice","priceHalf":80,"priceFull":140,"available":true},
    {"id":"2","name":"Chicken Momos","category":"momos","price":250,"available":true},
    {"id":"3","name":"Veg Momos","category":"momos","price":100,"available":false}
]"#;

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        admin_email: ADMIN_EMAIL.to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        admin_token_ttl_hours: 24,
        customer_token_ttl_hours: 24,
    }
}

pub fn paytm_config() -> PaytmConfig {
    PaytmConfig {
        mid: "BAMBOO12345".to_string(),
        merchant_key: MERCHANT_KEY.to_string(),
        website: "WEBSTAGING".to_string(),
        channel_id: "WEB".to_string(),
        industry_type: "Retail".to_string(),
        callback_url: "http://localhost:5000/api/paytm/callback".to_string(),
        frontend_url: FRONTEND_URL.to_string(),
        timeout_secs: 5,
        environment: Environment::Staging,
    }
}

pub fn upi_config() -> UpiConfig {
    UpiConfig {
        vpa: "bambooyardcafe@paytm".to_string(),
        payee_name: "Bamboo Yard Cafe".to_string(),
    }
}

pub async fn memory_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.seed("menu", MENU).await;
    store
}

pub async fn state_with(store: Arc<MemoryStore>, paytm: PaytmProvider) -> AppState {
    let repos = Repositories::load(store).await.unwrap();
    let payments = PaymentProviderFactory::with_providers(
        StubGatewayProvider::new(),
        paytm,
        ManualUpiProvider::new(upi_config()),
    );
    AppState::new(&auth_config(), repos, payments).unwrap()
}

pub async fn test_state(store: Arc<MemoryStore>) -> AppState {
    state_with(store, PaytmProvider::new(paytm_config()).unwrap()).await
}

pub async fn test_app() -> (Router, Arc<MemoryStore>) {
    let store = memory_store().await;
    let app = build_router(test_state(store.clone()).await);
    (app, store)
}

pub async fn collection(store: &MemoryStore, name: &str) -> Option<String> {
    store.load(name).await.unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn admin_token(app: &Router) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/admin/login",
            None,
            json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["token"].as_str().unwrap().to_string()
}

/// Signs up a customer and returns the session body
pub async fn signup(app: &Router, email: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/signup",
            None,
            json!({
                "name": "Asha",
                "email": email,
                "phone": "9876543210",
                "password": "s3cret-pass",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

pub fn cod_order(email: &str) -> Value {
    json!({
        "items": [
            { "menuItemId": "2", "name": "Chicken Momos", "quantity": 2, "price": 250 }
        ],
        "total": 500,
        "customerName": "Asha",
        "customerEmail": email,
        "customerPhone": "9876543210",
        "orderType": "pickup",
        "paymentMethod": "cod",
        "paymentStatus": "pending",
    })
}
