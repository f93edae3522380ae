//! Authentication middleware and extractors

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::server::AppState;
use crate::auth::jwt::TokenKind;
use crate::auth::models::Role;
use crate::auth::session::AuthService;
use crate::error::{Error, Result};

pub const MISSING_HEADER: &str = "Missing Authorization header";
pub const MALFORMED_HEADER: &str = "Malformed Authorization header";
pub const AUTH_REQUIRED: &str = "Authentication required";
pub const USER_NOT_FOUND: &str = "User not found";

/// Identity attached to the request once the bearer token checks out.
/// The role is the one stored on the user record, not the one in the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized(MISSING_HEADER))?;
    let value = value
        .to_str()
        .map_err(|_| Error::unauthorized(MALFORMED_HEADER))?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token),
        _ => Err(Error::unauthorized(MALFORMED_HEADER)),
    }
}

/// Verify the bearer token and resolve it to a stored user
pub async fn authenticate(service: &AuthService, headers: &HeaderMap) -> Result<AuthUser> {
    let token = bearer_token(headers)?;
    let claims = service.tokens().verify(TokenKind::Access, token)?;
    let id = Uuid::parse_str(&claims.sub).map_err(|_| Error::InvalidToken)?;

    let user = service
        .users()
        .find_by_id(id)
        .await?
        .ok_or_else(|| Error::unauthorized(USER_NOT_FOUND))?;

    Ok(AuthUser {
        id: user.id,
        role: user.role,
    })
}

/// Middleware for requiring authentication
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, Error> {
    let user = authenticate(&state.auth, req.headers()).await?;
    tracing::debug!(user_id = %user.id, role = %user.role, "Authenticated request");
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| Error::unauthorized(AUTH_REQUIRED))
    }
}
