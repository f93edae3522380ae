//! Configuration management for Grovekeeper

pub mod loader;
mod schema;

pub use loader::{load_config, load_config_or_env};
pub use schema::*;
