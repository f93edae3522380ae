//! Password hashing with bcrypt

use bcrypt::BcryptError;

use crate::auth::validation::INVALID_DATA;
use crate::error::{Error, Result};

/// Cost used when none is configured
pub const DEFAULT_COST: u32 = 10;

/// Cost bounds accepted by the bcrypt algorithm
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// bcrypt reads 72 bytes including a NUL terminator
pub const MAX_PASSWORD_BYTES: usize = 71;

/// One-way password hasher. Salting and constant-time comparison come from bcrypt.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password. Input longer than [`MAX_PASSWORD_BYTES`]
    /// is rejected rather than truncated.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        bcrypt::non_truncating_hash(plaintext, self.cost).map_err(|e| match e {
            BcryptError::Truncation(_) => Error::bad_request(INVALID_DATA),
            other => other.into(),
        })
    }

    /// Check a plaintext password against a stored hash.
    /// A malformed hash or an over-long password is a mismatch, not an error.
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        match bcrypt::non_truncating_verify(plaintext, hash) {
            Ok(valid) => valid,
            Err(BcryptError::Truncation(_)) => false,
            Err(e) => {
                tracing::warn!("Rejecting password check against unusable hash: {}", e);
                false
            }
        }
    }

    /// [`hash`](Self::hash) on the blocking pool
    pub async fn hash_async(&self, plaintext: String) -> Result<String> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext)).await?
    }

    /// [`verify`](Self::verify) on the blocking pool
    pub async fn verify_async(&self, plaintext: String, hash: String) -> Result<bool> {
        let hasher = *self;
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &hash)).await?)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}
