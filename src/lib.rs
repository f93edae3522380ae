//! Grovekeeper - site and tree inventory backend
//!
//! The library holds the HTTP API, its authentication core and the stores
//! behind it. The `grovekeeper` binary is a thin CLI over these modules.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod inventory;
pub mod store;

pub use config::Config;
pub use error::Error;
