//! Role gate for routes restricted beyond "authenticated"

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::auth::middleware::{AuthUser, AUTH_REQUIRED};
use crate::auth::models::Role;
use crate::error::{Error, Result};

pub const ADMIN_ONLY: &str = "Admin access only";

/// Admit `identity` only if its role is in `allowed`
pub fn authorize(identity: Option<&AuthUser>, allowed: &[Role]) -> Result<AuthUser> {
    let user = identity.ok_or_else(|| Error::unauthorized(AUTH_REQUIRED))?;
    if allowed.contains(&user.role) {
        Ok(*user)
    } else {
        tracing::warn!(user_id = %user.id, role = %user.role, "Denied by role gate");
        Err(Error::forbidden(denial_message(allowed)))
    }
}

/// `[Admin]` gives [`ADMIN_ONLY`]; `[Admin, User]` gives "Admin or user access only"
fn denial_message(allowed: &[Role]) -> String {
    let roles: Vec<&str> = allowed.iter().map(Role::as_str).collect();
    if roles.is_empty() {
        return "Access denied".to_string();
    }

    let mut message = format!("{} access only", roles.join(" or "));
    message[..1].make_ascii_uppercase();
    message
}

/// Must be layered inside `require_auth`
pub async fn require_admin(req: Request, next: Next) -> std::result::Result<Response, Error> {
    authorize(req.extensions().get::<AuthUser>(), &[Role::Admin])?;
    Ok(next.run(req).await)
}

/// Extractor for handlers that need an admin identity
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        authorize(parts.extensions.get::<AuthUser>(), &[Role::Admin]).map(AdminUser)
    }
}
