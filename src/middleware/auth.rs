//! Bearer-token gates
//!
//! `require_admin` guards the admin router and stores the admin claims in the request
//! extensions. Handlers take [`AdminSession`] or [`CustomerSession`] as extractors;
//! each rejects tokens issued for the other role with 403.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::api::AppState;
use crate::auth::{Claims, JwtService, Role};
use crate::error::{AppError, AppErrorKind, AuthError};
use crate::middleware::error::get_request_id_from_headers;

/// Claims of an authenticated admin
#[derive(Debug, Clone)]
pub struct AdminSession(pub Claims);

/// Claims of an authenticated storefront customer
#[derive(Debug, Clone)]
pub struct CustomerSession(pub Claims);

fn auth_error(kind: AuthError, headers: &HeaderMap) -> AppError {
    let err = AppError::new(AppErrorKind::Auth(kind));
    match get_request_id_from_headers(headers) {
        Some(request_id) => err.with_request_id(request_id),
        None => err,
    }
}

/// Validates the bearer token and checks it was issued for `role`
fn authenticate(headers: &HeaderMap, jwt: &JwtService, role: Role) -> Result<Claims, AppError> {
    let header = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| auth_error(AuthError::MissingToken, headers))?;
    let token = JwtService::extract_from_header(header).ok_or_else(|| {
        auth_error(
            AuthError::InvalidToken {
                reason: "malformed authorization header".to_string(),
            },
            headers,
        )
    })?;

    let claims = jwt.validate_token(token).map_err(|e| {
        warn!(error = %e, required_role = role.as_str(), "bearer token rejected");
        let err = AppError::from(e);
        match get_request_id_from_headers(headers) {
            Some(request_id) => err.with_request_id(request_id),
            None => err,
        }
    })?;

    if claims.role != role {
        warn!(
            subject = %claims.sub,
            token_role = claims.role.as_str(),
            required_role = role.as_str(),
            "token used outside its role"
        );
        return Err(auth_error(
            AuthError::Forbidden {
                required_role: role.as_str().to_string(),
            },
            headers,
        ));
    }
    Ok(claims)
}

/// Rejects the request unless it carries a valid admin token
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(req.headers(), &state.jwt, Role::Admin)?;
    req.extensions_mut().insert(AdminSession(claims));
    Ok(next.run(req).await)
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<AdminSession>() {
            return Ok(session.clone());
        }
        authenticate(&parts.headers, &state.jwt, Role::Admin).map(AdminSession)
    }
}

impl FromRequestParts<AppState> for CustomerSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, &state.jwt, Role::Customer).map(CustomerSession)
    }
}
