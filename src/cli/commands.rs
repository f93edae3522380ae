//! CLI command implementations

use anyhow::{bail, Context, Result};
use dialoguer::{theme::ColorfulTheme, Password};
use std::fs;
use uuid::Uuid;

use crate::api::{open_stores, run_server};
use crate::auth::models::{Gender, Role, UserView};
use crate::auth::password::MAX_PASSWORD_BYTES;
use crate::auth::validation::{is_valid_email, is_valid_password, MIN_NAME_LEN, MIN_PASSWORD_LEN};
use crate::auth::{PasswordHasher, Registrar, Registration};
use crate::cli::{info, print_user_table, success, warn, OutputFormat};
use crate::config::{self, loader::CONFIG_FILENAME, Config, StoreBackend};
use crate::store::PgStore;

/// Initialize a new grovekeeper.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = std::path::Path::new(CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", CONFIG_FILENAME));
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success(&format!("Created {}", CONFIG_FILENAME));
    info("Set JWT_ACCESS_SECRET and JWT_REFRESH_SECRET, then run 'grovekeeper migrate' and 'grovekeeper serve'");

    Ok(())
}

/// Start the HTTP API server
pub async fn serve(host: Option<String>, port: Option<u16>, memory: bool) -> Result<()> {
    let mut config = load_config()?;
    if memory {
        config.database.backend = StoreBackend::Memory;
    }

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting server on {}:{}", host, port));

    run_server(config, &host, port).await?;

    Ok(())
}

/// Create or update the database schema
pub async fn migrate() -> Result<()> {
    let config = load_config()?;
    if config.database.backend != StoreBackend::Postgres {
        warn("database.backend is not postgres; nothing to migrate");
        return Ok(());
    }

    let store = PgStore::connect(&config.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    store.migrate().await?;

    success("Schema is up to date");
    Ok(())
}

/// Print a bcrypt hash for a password
pub async fn hash_password(password: Option<String>) -> Result<()> {
    let cost = config::load_config_or_env()
        .map(|c| c.auth.bcrypt_cost)
        .unwrap_or(crate::auth::password::DEFAULT_COST);

    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };

    let hash = PasswordHasher::new(cost).hash_async(password).await?;
    println!("{}", hash);
    Ok(())
}

/// Create an admin account
pub async fn create_admin(
    name: String,
    email: String,
    password: Option<String>,
    site: Option<String>,
) -> Result<()> {
    let config = load_config()?;
    let stores = open_persistent_stores(&config).await?;

    if name.trim().chars().count() < MIN_NAME_LEN {
        bail!("Name must be at least {} characters", MIN_NAME_LEN);
    }
    if !is_valid_email(&email) {
        bail!("Invalid email: {}", email);
    }

    let site_id = site
        .map(|raw| Uuid::parse_str(raw.trim()).context("Invalid site id"))
        .transpose()?;

    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };
    if !is_valid_password(&password) {
        bail!(
            "Password must be at least {} characters and at most {} bytes",
            MIN_PASSWORD_LEN,
            MAX_PASSWORD_BYTES
        );
    }

    let registrar = Registrar::new(
        stores.users,
        stores.sites,
        PasswordHasher::new(config.auth.bcrypt_cost),
    );
    let user = registrar
        .register(Registration {
            name: name.trim().to_string(),
            email,
            password,
            role: Role::Admin,
            site_id,
            gender: Gender::default(),
            designation: None,
        })
        .await?;

    success(&format!("Created admin {} ({})", user.email, user.id));
    Ok(())
}

/// List registered users
pub async fn users(site: Option<String>, format: OutputFormat) -> Result<()> {
    let config = load_config()?;
    let stores = open_persistent_stores(&config).await?;

    let site = site
        .map(|raw| Uuid::parse_str(raw.trim()).context("Invalid site id"))
        .transpose()?;
    let users: Vec<UserView> = stores
        .users
        .list(site)
        .await?
        .iter()
        .map(UserView::from)
        .collect();

    match format {
        OutputFormat::Table => {
            print_user_table(&users);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&users)?;
            println!("{}", json);
        }
    }

    Ok(())
}

// Helper functions

fn load_config() -> Result<Config> {
    config::load_config_or_env().context("Failed to load configuration")
}

/// Administrative commands only make sense against a store that outlives them
async fn open_persistent_stores(config: &Config) -> Result<crate::store::Stores> {
    if config.database.backend == StoreBackend::Memory {
        bail!("database.backend is memory; this command needs postgres");
    }
    Ok(open_stores(config).await?)
}

fn prompt_password() -> Result<String> {
    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;
    Ok(password)
}
