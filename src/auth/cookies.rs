//! Refresh token cookie

use cookie::{Cookie, SameSite};

/// Name of the cookie carrying the refresh token
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Attributes of the refresh cookie
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    /// Set the Secure flag (production only)
    pub secure: bool,
    /// Max-Age in seconds, matches the refresh token lifetime
    pub max_age_secs: i64,
}

impl CookieSettings {
    pub fn new(secure: bool, max_age_secs: u64) -> Self {
        Self {
            secure,
            max_age_secs: i64::try_from(max_age_secs).unwrap_or(i64::MAX),
        }
    }
}

/// HttpOnly, SameSite=Lax cookie holding the refresh token
pub fn refresh_cookie(token: &str, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, token.to_string()))
        .http_only(true)
        .secure(settings.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(cookie::time::Duration::seconds(settings.max_age_secs))
        .build()
}
