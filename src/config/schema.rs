//! Configuration schema definitions

use serde::{Deserialize, Serialize};

use crate::auth::password::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::auth::Role;
use crate::error::{Error, Result};

/// Longest token lifetime accepted, ten years
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration for the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment, controls the `Secure` cookie flag
    #[serde(default)]
    pub environment: Environment,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Parse a `NODE_ENV` style value; anything but "production" is development
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// tokio-postgres connection string
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "host=localhost port=5432 user=postgres password=postgres dbname=grovekeeper".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Process-local store, contents are lost on exit
    Memory,
}

/// Token, password and signup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub access_secret: String,

    #[serde(default)]
    pub refresh_secret: String,

    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: u64,

    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: u64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Role given to identities created through `/auth/signup`
    #[serde(default = "default_role")]
    pub default_role: Role,

    #[serde(default)]
    pub signup: SignupPolicy,
}

fn default_access_ttl() -> u64 {
    15 * 60
}

fn default_refresh_ttl() -> u64 {
    7 * 24 * 60 * 60
}

fn default_bcrypt_cost() -> u32 {
    crate::auth::password::DEFAULT_COST
}

fn default_role() -> Role {
    Role::User
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            refresh_secret: String::new(),
            access_ttl_secs: default_access_ttl(),
            refresh_ttl_secs: default_refresh_ttl(),
            bcrypt_cost: default_bcrypt_cost(),
            default_role: default_role(),
            signup: SignupPolicy::default(),
        }
    }
}

/// Who may call `/auth/signup`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SignupPolicy {
    #[default]
    Open,
    /// Signup requires a bearer token belonging to an admin
    Admin,
}

impl AuthConfig {
    /// Reject settings the token and password layers cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.access_secret.trim().is_empty() {
            return Err(Error::Config("JWT_ACCESS_SECRET is not set".to_string()));
        }
        if self.refresh_secret.trim().is_empty() {
            return Err(Error::Config("JWT_REFRESH_SECRET is not set".to_string()));
        }
        if self.access_secret == self.refresh_secret {
            return Err(Error::Config(
                "access and refresh secrets must differ".to_string(),
            ));
        }
        for ttl in [self.access_ttl_secs, self.refresh_ttl_secs] {
            if !(1..=MAX_TOKEN_TTL_SECS).contains(&ttl) {
                return Err(Error::Config(format!(
                    "token lifetimes must be between 1 and {} seconds",
                    MAX_TOKEN_TTL_SECS
                )));
            }
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(Error::Config(format!(
                "bcrypt_cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }
        Ok(())
    }
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.server.environment == Environment::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_with_secrets() -> AuthConfig {
        AuthConfig {
            access_secret: "access-secret".to_string(),
            refresh_secret: "refresh-secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.auth.access_ttl_secs, 900);
        assert_eq!(config.auth.refresh_ttl_secs, 604_800);
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.auth.default_role, Role::User);
        assert_eq!(config.auth.signup, SignupPolicy::Open);
        assert!(!config.is_production());
    }

    #[test]
    fn test_missing_secrets_fail_closed() {
        let err = AuthConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("JWT_ACCESS_SECRET"));

        let config = AuthConfig {
            access_secret: "a".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("JWT_REFRESH_SECRET"));
    }

    #[test]
    fn test_identical_secrets_rejected() {
        let config = AuthConfig {
            access_secret: "same".to_string(),
            refresh_secret: "same".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bcrypt_cost_range() {
        let mut config = auth_with_secrets();
        assert!(config.validate().is_ok());
        config.bcrypt_cost = 3;
        assert!(config.validate().is_err());
        config.bcrypt_cost = 32;
        assert!(config.validate().is_err());
        config.bcrypt_cost = MAX_BCRYPT_COST;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_token_lifetimes_are_bounded() {
        let mut config = auth_with_secrets();
        config.access_ttl_secs = MAX_TOKEN_TTL_SECS;
        assert!(config.validate().is_ok());

        config.access_ttl_secs = u64::MAX;
        assert!(config.validate().is_err());

        config.access_ttl_secs = 900;
        config.refresh_ttl_secs = MAX_TOKEN_TTL_SECS + 1;
        assert!(config.validate().is_err());

        config.refresh_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_from_env_value() {
        assert_eq!(
            Environment::from_env_value("production"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_env_value("development"),
            Environment::Development
        );
        assert_eq!(Environment::from_env_value(""), Environment::Development);
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9000
            environment = "production"

            [database]
            backend = "memory"

            [auth]
            access_secret = "a"
            refresh_secret = "r"
            default_role = "admin"
            signup = "admin"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert!(config.is_production());
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.auth.default_role, Role::Admin);
        assert_eq!(config.auth.signup, SignupPolicy::Admin);
        assert_eq!(config.auth.access_ttl_secs, 900);
    }
}
