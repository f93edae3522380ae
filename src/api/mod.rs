//! HTTP API server

pub mod admin;
pub mod extract;
pub mod member;
pub mod routes;
pub mod server;

pub use server::*;
