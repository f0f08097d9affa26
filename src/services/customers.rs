//! Customer accounts: signup, login and profile lookup

use crate::auth::{hash_password, verify_password, Claims, JwtService, Role};
use crate::database::error::{DatabaseError, DatabaseErrorKind};
use crate::database::repository::Repository;
use crate::database::CustomerRepository;
use crate::error::{AppError, AppErrorKind, AppResult, AuthError, DomainError};
use crate::logging::mask_email;
use crate::models::{next_time_id, non_blank, Customer, PublicCustomer};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body returned by signup and login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub message: String,
    pub token: String,
    pub user: PublicCustomer,
}

fn required(value: &Option<String>, field: &str) -> AppResult<String> {
    non_blank(value)
        .map(str::to_string)
        .ok_or_else(|| AppError::missing_field(field))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct CustomerService {
    repo: Arc<CustomerRepository>,
    jwt: JwtService,
    token_ttl: Duration,
}

impl CustomerService {
    pub fn new(repo: Arc<CustomerRepository>, jwt: JwtService, token_ttl_hours: i64) -> Self {
        Self {
            repo,
            jwt,
            token_ttl: Duration::hours(token_ttl_hours),
        }
    }

    fn session(&self, customer: &Customer, message: &str) -> AppResult<SessionResponse> {
        let token = self.jwt.generate_token(
            &customer.id,
            &customer.email,
            &customer.name,
            Role::Customer,
            self.token_ttl,
        )?;
        Ok(SessionResponse {
            message: message.to_string(),
            token,
            user: PublicCustomer::from(customer),
        })
    }

    pub async fn signup(&self, request: SignupRequest) -> AppResult<SessionResponse> {
        let name = required(&request.name, "name")?;
        let email = normalize_email(&required(&request.email, "email")?);
        let phone = required(&request.phone, "phone")?;
        let password = request
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::missing_field("password"))?;
        if !email.contains('@') {
            return Err(AppError::invalid_field("email", "not an email address"));
        }

        let password_hash = hash_password(&password).map_err(|e| {
            AppError::new(AppErrorKind::Infrastructure(
                crate::error::InfrastructureError::Configuration {
                    message: format!("password hashing failed: {}", e),
                },
            ))
        })?;
        let customer = Customer {
            id: next_time_id(),
            name,
            email,
            phone,
            password_hash,
            created_at: Utc::now(),
        };

        // Email uniqueness is checked under the collection write lock
        let stored = self
            .repo
            .mutate(|customers| -> Result<Customer, DatabaseError> {
                if customers.iter().any(|c| c.email == customer.email) {
                    return Err(DatabaseError::new(DatabaseErrorKind::Duplicate {
                        entity: "customer".to_string(),
                        id: customer.email.clone(),
                    }));
                }
                customers.push(customer.clone());
                Ok(customer.clone())
            })
            .await?;

        info!(customer_id = %stored.id, email = %mask_email(&stored.email), "customer signed up");
        self.session(&stored, "User created successfully")
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<SessionResponse> {
        let email = normalize_email(&required(&request.email, "email")?);
        let password = request
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::missing_field("password"))?;

        let customer = self
            .repo
            .find_where(|c| c.email == email)
            .await
            .into_iter()
            .next();
        match customer {
            Some(customer) if verify_password(&password, &customer.password_hash) => {
                info!(customer_id = %customer.id, "customer logged in");
                self.session(&customer, "Login successful")
            }
            _ => {
                warn!(email = %mask_email(&email), "customer login rejected");
                Err(AppError::new(AppErrorKind::Auth(AuthError::InvalidCredentials)))
            }
        }
    }

    pub async fn profile(&self, claims: &Claims) -> AppResult<PublicCustomer> {
        self.repo
            .find_by_id(&claims.sub)
            .await?
            .map(|customer| PublicCustomer::from(&customer))
            .ok_or_else(|| {
                AppError::new(AppErrorKind::Domain(DomainError::CustomerNotFound {
                    customer_id: claims.sub.clone(),
                }))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::JsonRepository;
    use crate::database::store::MemoryStore;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    async fn service() -> CustomerService {
        let repo = JsonRepository::load(Arc::new(MemoryStore::new())).await.unwrap();
        CustomerService::new(Arc::new(repo), JwtService::new(SECRET), 24)
    }

    fn signup() -> SignupRequest {
        SignupRequest {
            name: Some("Asha".to_string()),
            email: Some("Asha@Example.com ".to_string()),
            phone: Some("9876543210".to_string()),
            password: Some("s3cret-pass".to_string()),
        }
    }

    #[tokio::test]
    async fn signup_then_login() {
        let service = service().await;
        let created = service.signup(signup()).await.unwrap();
        assert_eq!(created.message, "User created successfully");
        assert_eq!(created.user.email, "asha@example.com");

        let session = service
            .login(LoginRequest {
                email: Some("asha@example.com".to_string()),
                password: Some("s3cret-pass".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(session.message, "Login successful");

        let claims = JwtService::new(SECRET).validate_token(&session.token).unwrap();
        assert_eq!(claims.role, Role::Customer);
        assert_eq!(service.profile(&claims).await.unwrap(), created.user);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let service = service().await;
        service.signup(signup()).await.unwrap();
        let err = service.signup(signup()).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let service = service().await;
        service.signup(signup()).await.unwrap();
        let err = service
            .login(LoginRequest {
                email: Some("asha@example.com".to_string()),
                password: Some("nope".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);

        let unknown = service
            .login(LoginRequest {
                email: Some("ghost@example.com".to_string()),
                password: Some("nope".to_string()),
            })
            .await
            .unwrap_err();
        assert_eq!(unknown.status_code(), 401);
    }

    #[tokio::test]
    async fn signup_requires_every_field() {
        let mut request = signup();
        request.phone = None;
        assert_eq!(service().await.signup(request).await.unwrap_err().status_code(), 400);
    }
}
