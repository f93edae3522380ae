//! JWT token handling

use crate::auth::models::{Role, User};
use crate::config::AuthConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User role at issuance
    pub role: Role,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived, sent in the Authorization header
    Access,
    /// Long-lived, delivered only in the refresh cookie
    Refresh,
}

/// Signs and verifies tokens of one kind with one secret
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Create a token for `sub` that expires `ttl` from now
    pub fn issue(&self, sub: &str, role: Role) -> Result<String> {
        self.issue_at(sub, role, Utc::now())
    }

    /// Create a token as if issued at `issued_at`
    pub fn issue_at(&self, sub: &str, role: Role, issued_at: DateTime<Utc>) -> Result<String> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| Error::Internal("token expiry out of range".to_string()))?;
        let claims = Claims {
            sub: sub.to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Validate signature, structure and expiry
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                Error::InvalidToken
            })
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Tokens handed out on signup and signin
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Access and refresh signers with independent secrets
#[derive(Debug)]
pub struct TokenService {
    access: TokenSigner,
    refresh: TokenSigner,
}

impl TokenService {
    pub fn new(access: TokenSigner, refresh: TokenSigner) -> Self {
        Self { access, refresh }
    }

    /// Build from validated settings; fails closed when secrets are missing
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            TokenSigner::new(&config.access_secret, seconds(config.access_ttl_secs)),
            TokenSigner::new(&config.refresh_secret, seconds(config.refresh_ttl_secs)),
        ))
    }

    pub fn signer(&self, kind: TokenKind) -> &TokenSigner {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn issue(&self, kind: TokenKind, user: &User) -> Result<String> {
        self.signer(kind).issue(&user.id.to_string(), user.role)
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue(TokenKind::Access, user)?,
            refresh: self.issue(TokenKind::Refresh, user)?,
        })
    }

    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims> {
        self.signer(kind).verify(token)
    }
}

fn seconds(secs: u64) -> Duration {
    let secs = i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1000);
    Duration::seconds(secs)
}
