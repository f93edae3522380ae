//! Configuration loading, environment variable interpolation and overrides

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use super::{Config, Environment};

pub const CONFIG_FILENAME: &str = "grovekeeper.toml";

static VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase")
});

/// Load configuration from grovekeeper.toml, then apply environment overrides
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    let mut config = load_config_from_path(&config_path)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Load grovekeeper.toml if one exists, otherwise build the config from
/// defaults and the process environment alone.
pub fn load_config_or_env() -> Result<Config> {
    match load_config() {
        Err(Error::ConfigNotFound) => {
            tracing::debug!("No {} found, using environment", CONFIG_FILENAME);
            let mut config = Config::default();
            apply_env_overrides(&mut config);
            Ok(config)
        }
        other => other,
    }
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<std::path::PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    VAR_RE.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Apply the process environment on top of a loaded config
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| env::var(key).ok());
}

/// Apply overrides from an arbitrary variable source. Empty values are ignored.
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(secret) = get("JWT_ACCESS_SECRET") {
        config.auth.access_secret = secret;
    }
    if let Some(secret) = get("JWT_REFRESH_SECRET") {
        config.auth.refresh_secret = secret;
    }
    if let Some(ttl) = get("JWT_ACCESS_TTL").and_then(|v| v.parse().ok()) {
        config.auth.access_ttl_secs = ttl;
    }
    if let Some(ttl) = get("JWT_REFRESH_TTL").and_then(|v| v.parse().ok()) {
        config.auth.refresh_ttl_secs = ttl;
    }
    if let Some(env_name) = get("NODE_ENV") {
        config.server.environment = Environment::from_env_value(&env_name);
    }
    if let Some(url) = get("DATABASE_URL") {
        config.database.url = url;
    }
    if let Some(port) = get("PORT").and_then(|v| v.parse().ok()) {
        config.server.port = port;
    }
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# Grovekeeper Configuration

[server]
host = "0.0.0.0"
port = 8000
# "production" turns on the Secure flag of the refresh cookie (NODE_ENV overrides)
environment = "development"

[database]
backend = "postgres"  # or "memory"
url = "${DATABASE_URL:-host=localhost port=5432 user=postgres password=postgres dbname=grovekeeper}"

[auth]
# Both secrets are required and must differ; the server refuses to start otherwise
access_secret = "${JWT_ACCESS_SECRET}"
refresh_secret = "${JWT_REFRESH_SECRET}"
access_ttl_secs = 900        # 15 minutes
refresh_ttl_secs = 604800    # 7 days
bcrypt_cost = 10

# Role assigned to accounts created through /auth/signup
default_role = "user"

# "open": anyone may sign up; "admin": signup needs an admin bearer token
signup = "open"
"#
}
