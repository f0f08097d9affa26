//! Admin Review Service
//!
//! A single bootstrap admin whose password is hashed once at startup, plus the
//! dashboard statistics over orders, reservations and the menu.

use crate::auth::{hash_password, verify_password, Claims, JwtService, Role};
use crate::config::AuthConfig;
use crate::database::repository::Repository;
use crate::database::Repositories;
use crate::error::{AppError, AppErrorKind, AppResult, AuthError, InfrastructureError};
use crate::logging::mask_email;
use crate::models::OrderStatus;
use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const ADMIN_ID: &str = "admin-1";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdminLoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLoginResponse {
    pub message: String,
    pub token: String,
    pub admin: AdminProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_orders: usize,
    /// Sum of `total` over delivered orders
    pub total_revenue: Decimal,
    pub pending_orders: usize,
    pub total_reservations: usize,
    pub menu_items: usize,
    pub available_items: usize,
}

pub struct AdminService {
    email: String,
    password_hash: String,
    jwt: JwtService,
    token_ttl: Duration,
    repos: Repositories,
}

impl AdminService {
    pub fn new(config: &AuthConfig, jwt: JwtService, repos: Repositories) -> AppResult<Self> {
        let password_hash = hash_password(&config.admin_password).map_err(|e| {
            AppError::new(AppErrorKind::Infrastructure(InfrastructureError::Configuration {
                message: format!("failed to hash admin password: {}", e),
            }))
        })?;
        Ok(Self {
            email: config.admin_email.trim().to_lowercase(),
            password_hash,
            jwt,
            token_ttl: Duration::hours(config.admin_token_ttl_hours),
            repos,
        })
    }

    pub fn login(&self, request: AdminLoginRequest) -> AppResult<AdminLoginResponse> {
        let email = request
            .email
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .unwrap_or_default();
        let password = request.password.unwrap_or_default();

        if email != self.email || !verify_password(&password, &self.password_hash) {
            warn!(email = %mask_email(&email), "admin login rejected");
            return Err(AppError::new(AppErrorKind::Auth(AuthError::InvalidCredentials)));
        }

        let token =
            self.jwt
                .generate_token(ADMIN_ID, &self.email, "Admin", Role::Admin, self.token_ttl)?;
        info!(admin_id = ADMIN_ID, "admin logged in");
        Ok(AdminLoginResponse {
            message: "Login successful".to_string(),
            token,
            admin: AdminProfile {
                id: ADMIN_ID.to_string(),
                email: self.email.clone(),
                role: Role::Admin,
            },
        })
    }

    /// Claims echoed back to a client checking its stored token
    pub fn verify(&self, claims: &Claims) -> serde_json::Value {
        serde_json::json!({ "valid": true, "user": claims })
    }

    pub async fn stats(&self) -> AppResult<DashboardStats> {
        let orders = self.repos.orders.find_all().await?;
        let total_revenue = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Delivered)
            .map(|o| o.total)
            .sum();
        let pending_orders = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count();

        Ok(DashboardStats {
            total_orders: orders.len(),
            total_revenue,
            pending_orders,
            total_reservations: self.repos.reservations.len().await,
            menu_items: self.repos.menu.len().await,
            available_items: self.repos.menu.count_where(|item| item.available).await,
        })
    }
}
