//! Signed session tokens
//!
//! Both admins and customers authenticate with HS256 JWTs signed by the same secret.
//! The `role` claim separates the two audiences, so a customer token never opens an
//! admin route.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{AppError, AppErrorKind, AuthError};

const ISSUER: &str = "bambooyard-backend";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }
}

/// Claims stored in every token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Admin or customer id
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        let kind = match err {
            JwtError::ExpiredToken => AuthError::TokenExpired,
            JwtError::InvalidToken(reason) => AuthError::InvalidToken { reason },
            JwtError::InvalidSignature => AuthError::InvalidToken {
                reason: "invalid signature".to_string(),
            },
            JwtError::GenerationFailed(message) => {
                return AppError::new(AppErrorKind::Infrastructure(
                    crate::error::InfrastructureError::Configuration { message },
                ))
            }
        };
        AppError::new(AppErrorKind::Auth(kind))
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn generate_token(
        &self,
        subject: &str,
        email: &str,
        name: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            role,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            iss: ISSUER.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["sub", "exp", "iss"]);
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Extracts the token from an `Authorization: Bearer <token>` header value
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
